// src/types.rs
use std::fmt;

// 线路协议里的固定文本
pub const READY_BANNER: &str = "ARDUINO_DAQ_READY";
pub const HEADER_LINE: &str = "Sample,Time(ms),A0(V),A1(V),A2(V),A3(V)";
pub const RECORDING_STARTED: &str = "RECORDING_STARTED";
pub const RECORDING_COMPLETE: &str = "RECORDING_COMPLETE";
pub const SAMPLES_COLLECTED_PREFIX: &str = "SAMPLES_COLLECTED:";
pub const END_OF_DATA: &str = "END_OF_DATA";
pub const START_COMMAND: &str = "START";

/// Number of analog inputs per row. Fixes the row schema, so it is not configurable.
pub const CHANNEL_COUNT: usize = 4;

// 数据集列名
pub const SAMPLE_COLUMN: &str = "Sample";
pub const TIME_COLUMN: &str = "Time(ms)";
pub const CHANNEL_COLUMNS: [&str; CHANNEL_COUNT] = ["A0(V)", "A1(V)", "A2(V)", "A3(V)"];
pub const FILTERED_SUFFIX: &str = "_filtered";

pub fn default_columns() -> Vec<String> {
    std::iter::once(SAMPLE_COLUMN)
        .chain(std::iter::once(TIME_COLUMN))
        .chain(CHANNEL_COLUMNS)
        .map(str::to_owned)
        .collect()
}

// 主机发给设备的命令
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
}

impl Command {
    /// Recognizes a command token. Surrounding whitespace is ignored; anything else is `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            START_COMMAND => Some(Command::Start),
            _ => None,
        }
    }

    pub fn as_line(&self) -> &'static str {
        match self {
            Command::Start => START_COMMAND,
        }
    }
}

/// One emitted sample: `<index>,<elapsedMs>,<v0>,<v1>,<v2>,<v3>`.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRow {
    pub index: u32,
    pub elapsed_ms: u32,
    pub voltages: [f32; CHANNEL_COUNT],
}

impl SampleRow {
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.trim().split(',');
        let index = fields.next()?.trim().parse().ok()?;
        let elapsed_ms = fields.next()?.trim().parse().ok()?;
        let mut voltages = [0.0f32; CHANNEL_COUNT];
        for slot in voltages.iter_mut() {
            *slot = fields.next()?.trim().parse().ok()?;
        }
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            index,
            elapsed_ms,
            voltages,
        })
    }
}

impl fmt::Display for SampleRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.index, self.elapsed_ms)?;
        for v in &self.voltages {
            // 三位小数是下游消费者依赖的格式
            write!(f, ",{:.3}", v)?;
        }
        Ok(())
    }
}

// 设备发给主机的消息
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceMessage {
    Ready,
    Header,
    RecordingStarted,
    Row(SampleRow),
    RecordingComplete,
    SamplesCollected(u32),
    EndOfData,
}

impl DeviceMessage {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            READY_BANNER => Some(DeviceMessage::Ready),
            HEADER_LINE => Some(DeviceMessage::Header),
            RECORDING_STARTED => Some(DeviceMessage::RecordingStarted),
            RECORDING_COMPLETE => Some(DeviceMessage::RecordingComplete),
            END_OF_DATA => Some(DeviceMessage::EndOfData),
            _ => {
                if let Some(count) = line.strip_prefix(SAMPLES_COLLECTED_PREFIX) {
                    return count.trim().parse().ok().map(DeviceMessage::SamplesCollected);
                }
                SampleRow::parse(line).map(DeviceMessage::Row)
            }
        }
    }
}

impl fmt::Display for DeviceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceMessage::Ready => f.write_str(READY_BANNER),
            DeviceMessage::Header => f.write_str(HEADER_LINE),
            DeviceMessage::RecordingStarted => f.write_str(RECORDING_STARTED),
            DeviceMessage::Row(row) => write!(f, "{row}"),
            DeviceMessage::RecordingComplete => f.write_str(RECORDING_COMPLETE),
            DeviceMessage::SamplesCollected(n) => write!(f, "{SAMPLES_COLLECTED_PREFIX}{n}"),
            DeviceMessage::EndOfData => f.write_str(END_OF_DATA),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn row_uses_three_decimal_voltages() {
        let row = SampleRow {
            index: 7,
            elapsed_ms: 14,
            voltages: [0.0, 1.0, 2.5, 1023.0 * (5.0 / 1023.0)],
        };
        assert_eq!(row.to_string(), "7,14,0.000,1.000,2.500,5.000");
    }
    #[test]
    fn parses_protocol_lines() {
        assert_eq!(DeviceMessage::parse("ARDUINO_DAQ_READY\r"), Some(DeviceMessage::Ready));
        assert_eq!(
            DeviceMessage::parse("SAMPLES_COLLECTED:2500"),
            Some(DeviceMessage::SamplesCollected(2500))
        );
        let msg = DeviceMessage::parse("3,6,0.010,4.995,2.000,0.000").unwrap();
        match msg {
            DeviceMessage::Row(row) => {
                assert_eq!(row.index, 3);
                assert_eq!(row.elapsed_ms, 6);
                assert!((row.voltages[1] - 4.995).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(DeviceMessage::parse("3,6,0.010"), None);
        assert_eq!(DeviceMessage::parse("garbage"), None);
    }
    #[test]
    fn only_start_is_a_command() {
        assert_eq!(Command::parse(" START \n"), Some(Command::Start));
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse("STOP"), None);
        assert_eq!(Command::Start.as_line(), "START");
    }
}
