// src/types.rs
use crate::parser::{FileType, ParsedLine};
use std::path::PathBuf;

// 连接模式
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum ConnectionMode {
    Simulation,
    Hardware,
}

// GUI 发给后台的命令
#[derive(Clone, Debug)]
pub enum GuiCommand {
    RefreshPorts,
    Connect { mode: ConnectionMode, port: String, baud: u32 },
    Disconnect,
    SetBaudRate(u32),
    SetDelimiter(String),
    ToggleIngestion,
    // 用户输入的原始文本，由后台负责解析
    SetCalibration { index: usize, value: String },
    Export { filename: String, file_type: FileType },
}

// 后台发给 GUI 的消息
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Ports(Vec<String>),
    Status(bool),          // 连接状态
    DelimiterReady(bool),
    Ingesting(bool),
    ChannelAdded(usize),   // 逐个增删通道
    ChannelRemoved(usize),
    Calibration(Vec<f64>),
    Window(Vec<ParsedLine>), // 显示窗口
    Exported(PathBuf),
    ExportFailed(String),
}
