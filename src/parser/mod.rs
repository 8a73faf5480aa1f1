// 串口数据解析核心：分词、校准、日志、导出
pub mod bootstrap;
pub mod calibration;
pub mod datalog;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod serial;
pub mod source;
pub mod tokenizer;
// 公开导出常用类型，方便外部调用
pub use calibration::ResizeStep;
pub use datalog::ParsedLine;
pub use error::ParserError;
pub use export::FileType;
pub use pipeline::{IngestionPipeline, Tick};
pub use serial::{available_ports, SerialSession};
pub use source::{LineSource, SimulatedSource};
