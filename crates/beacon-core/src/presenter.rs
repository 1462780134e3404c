//! Display model for decoded frames.
//!
//! The [`Presenter`] turns each [`SensorFrame`] into text for the seven
//! [`DisplaySlots`] and appends its values to four [`Series`]. After every
//! frame the three chart groups are redrawn through a [`ChartSink`].

use std::collections::HashMap;

use beacon_types::{SensorFrame, advertisement_text};
use chrono::{Local, TimeZone};

/// Date-time layout used for the device clock.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Text shown for each field of the most recent frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplaySlots {
    pub device_name: String,
    pub unique_name: String,
    pub date_time: String,
    pub temperature: String,
    pub humidity: String,
    pub illuminance: String,
    pub battery: String,
}

impl DisplaySlots {
    /// Empty every slot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Slots as `(caption, text)` rows in display order.
    pub fn rows(&self) -> [(&'static str, &str); 7] {
        [
            ("Device Name", self.device_name.as_str()),
            ("Unique Name", self.unique_name.as_str()),
            ("Date Time", self.date_time.as_str()),
            ("Temperature", self.temperature.as_str()),
            ("Humidity", self.humidity.as_str()),
            ("Illuminance", self.illuminance.as_str()),
            ("Battery Voltage", self.battery.as_str()),
        ]
    }
}

/// The four measured quantities that are charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Temperature,
    Humidity,
    Illuminance,
    BatteryVoltage,
}

impl SeriesKind {
    /// All kinds in accumulation order.
    pub const ALL: [SeriesKind; 4] = [
        SeriesKind::Temperature,
        SeriesKind::Humidity,
        SeriesKind::Illuminance,
        SeriesKind::BatteryVoltage,
    ];

    /// Chart legend label.
    pub fn label(self) -> &'static str {
        match self {
            SeriesKind::Temperature => "Temperature",
            SeriesKind::Humidity => "Humidity",
            SeriesKind::Illuminance => "Illuminance",
            SeriesKind::BatteryVoltage => "Battery Voltage",
        }
    }
}

/// A labeled chart column: the label followed by every value in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub values: Vec<f64>,
}

impl Column {
    /// The column as text cells, `[label, v1, v2, ...]`.
    pub fn cells(&self) -> Vec<String> {
        std::iter::once(self.label.clone())
            .chain(self.values.iter().map(|v| v.to_string()))
            .collect()
    }
}

/// An append-only sequence of values for one quantity.
///
/// Grows for as long as a connection lasts; [`reset`](Self::reset) empties it.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    kind: SeriesKind,
    values: Vec<f64>,
}

impl Series {
    /// Create an empty series.
    pub fn new(kind: SeriesKind) -> Self {
        Self {
            kind,
            values: Vec::new(),
        }
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Drop every value, leaving only the label.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Snapshot as a chart column.
    pub fn column(&self) -> Column {
        Column {
            label: self.label().to_string(),
            values: self.values.clone(),
        }
    }
}

/// The four series owned by a presenter.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    pub temperature: Series,
    pub humidity: Series,
    pub illuminance: Series,
    pub battery: Series,
}

impl Default for SeriesSet {
    fn default() -> Self {
        Self {
            temperature: Series::new(SeriesKind::Temperature),
            humidity: Series::new(SeriesKind::Humidity),
            illuminance: Series::new(SeriesKind::Illuminance),
            battery: Series::new(SeriesKind::BatteryVoltage),
        }
    }
}

impl SeriesSet {
    pub fn get(&self, kind: SeriesKind) -> &Series {
        match kind {
            SeriesKind::Temperature => &self.temperature,
            SeriesKind::Humidity => &self.humidity,
            SeriesKind::Illuminance => &self.illuminance,
            SeriesKind::BatteryVoltage => &self.battery,
        }
    }

    /// Reset all four series.
    pub fn reset(&mut self) {
        self.temperature.reset();
        self.humidity.reset();
        self.illuminance.reset();
        self.battery.reset();
    }

    /// Append one point per series.
    fn append(&mut self, frame: &SensorFrame) {
        self.temperature.push(f64::from(frame.temperature()));
        self.humidity.push(f64::from(frame.humidity()));
        self.illuminance.push(f64::from(frame.illuminance()));
        self.battery.push(f64::from(frame.battery_voltage()));
    }

    /// The series drawn by `group`.
    pub fn group(&self, group: ChartGroup) -> Vec<&Series> {
        group.kinds().iter().map(|k| self.get(*k)).collect()
    }
}

/// The three charts, redrawn in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartGroup {
    TemperatureHumidity,
    Illuminance,
    Battery,
}

impl ChartGroup {
    /// All groups in redraw order.
    pub const ALL: [ChartGroup; 3] = [
        ChartGroup::TemperatureHumidity,
        ChartGroup::Illuminance,
        ChartGroup::Battery,
    ];

    /// Series shown on this chart.
    pub fn kinds(self) -> &'static [SeriesKind] {
        match self {
            ChartGroup::TemperatureHumidity => &[SeriesKind::Temperature, SeriesKind::Humidity],
            ChartGroup::Illuminance => &[SeriesKind::Illuminance],
            ChartGroup::Battery => &[SeriesKind::BatteryVoltage],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartGroup::TemperatureHumidity => "Temperature / Humidity",
            ChartGroup::Illuminance => "Illuminance",
            ChartGroup::Battery => "Battery Voltage",
        }
    }
}

/// Something that can draw a chart from its columns.
pub trait ChartSink {
    /// Replace the contents of `group` with `columns`.
    fn redraw(&mut self, group: ChartGroup, columns: &[&Series]);
}

/// A [`ChartSink`] that remembers what it was asked to draw.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    redraws: Vec<ChartGroup>,
    latest: HashMap<ChartGroup, Vec<Column>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups redrawn so far, in call order.
    pub fn redraws(&self) -> &[ChartGroup] {
        &self.redraws
    }

    /// Columns from the most recent redraw of `group`.
    pub fn latest(&self, group: ChartGroup) -> Option<&[Column]> {
        self.latest.get(&group).map(Vec::as_slice)
    }

    /// Forget recorded redraw order.
    pub fn clear(&mut self) {
        self.redraws.clear();
    }
}

impl ChartSink for RecordingSink {
    fn redraw(&mut self, group: ChartGroup, columns: &[&Series]) {
        self.redraws.push(group);
        self.latest
            .insert(group, columns.iter().map(|s| s.column()).collect());
    }
}

/// Format a device clock reading in the local time zone.
pub fn format_timestamp(timestamp: u32) -> String {
    format_timestamp_in(timestamp, &Local)
}

/// Format a device clock reading in `tz` as `YYYY/MM/DD HH:MM:SS`.
///
/// ```
/// use beacon_core::presenter::format_timestamp_in;
///
/// assert_eq!(format_timestamp_in(0, &chrono::Utc), "1970/01/01 00:00:00");
/// ```
pub fn format_timestamp_in<Tz>(timestamp: u32, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_opt(i64::from(timestamp), 0).earliest() {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}

/// Render a decoded value exactly.
///
/// Every `hi + lo / 256` reading is exact in `f64`, so nothing is rounded
/// away (`22.00390625`, not `22.003906`).
pub fn format_value(value: f32) -> String {
    f64::from(value).to_string()
}

/// Text slots and chart series for one connection session.
#[derive(Debug, Clone)]
pub struct Presenter<S> {
    slots: DisplaySlots,
    series: SeriesSet,
    sink: S,
    last_frame: Option<SensorFrame>,
}

impl<S: ChartSink> Presenter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            slots: DisplaySlots::default(),
            series: SeriesSet::default(),
            sink,
            last_frame: None,
        }
    }

    /// Show `frame`, extend every series and redraw the charts.
    pub fn present(&mut self, frame: &SensorFrame) {
        self.slots.device_name = frame.device_name.clone();
        self.slots.unique_name = frame.unique_name.clone();
        self.slots.date_time = format_timestamp(frame.timestamp());
        self.slots.temperature = format_value(frame.temperature());
        self.slots.humidity = format_value(frame.humidity());
        self.slots.illuminance = frame.illuminance().to_string();
        self.slots.battery = format_value(frame.battery_voltage());

        self.series.append(frame);
        self.last_frame = Some(frame.clone());
        self.redraw();
    }

    /// Show a raw advertisement payload in the temperature slot.
    pub fn on_advertisement(&mut self, payload: &[u8]) {
        self.slots.temperature = advertisement_text(payload);
    }

    /// Clear the table and reset every chart to its label.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.series.reset();
        self.last_frame = None;
        self.redraw();
    }

    fn redraw(&mut self) {
        for group in ChartGroup::ALL {
            let columns = self.series.group(group);
            self.sink.redraw(group, &columns);
        }
    }

    pub fn slots(&self) -> &DisplaySlots {
        &self.slots
    }

    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The most recently presented frame, if any since the last reset.
    pub fn last_frame(&self) -> Option<&SensorFrame> {
        self.last_frame.as_ref()
    }
}

impl<S: ChartSink + Default> Default for Presenter<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
