// src/engine.rs
use crate::config::AppConfig;
use crate::parser::{
    available_ports, IngestionPipeline, LineSource, ParserError, ResizeStep, SerialSession,
    SimulatedSource, Tick,
};
use crate::types::*;
use log::{info, warn};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

type BoxedSource = Box<dyn LineSource + Send>;

/// 后台引擎：持有串口会话与解析管线，一次只处理一行
struct Engine {
    config: AppConfig,
    tx: Sender<EngineMessage>,
    pipeline: IngestionPipeline,
    source: Option<BoxedSource>,
    // 模拟模式下分隔符变化时需要重建数据源
    simulated: bool,
}

pub fn spawn_thread(config: AppConfig, tx: Sender<EngineMessage>, rx_cmd: Receiver<GuiCommand>) {
    thread::spawn(move || {
        let mut engine = Engine::new(config, tx);
        engine.log("⚙️ Parser Engine Ready.");
        engine.refresh_ports();

        loop {
            // ============================================================
            // 1. 消息处理 (处理 GUI 发来的命令)
            // ============================================================
            for _ in 0..10 {
                match rx_cmd.try_recv() {
                    Ok(cmd) => engine.handle(cmd),
                    Err(TryRecvError::Empty) => break,
                    // GUI 已关闭
                    Err(TryRecvError::Disconnected) => return,
                }
            }

            // ============================================================
            // 2. 数据流循环 (每轮最多读取一行)
            // ============================================================
            if !engine.tick() {
                thread::sleep(Duration::from_millis(50));
            }
        }
    });
}

impl Engine {
    fn new(config: AppConfig, tx: Sender<EngineMessage>) -> Self {
        Self { config, tx, pipeline: IngestionPipeline::new(), source: None, simulated: false }
    }

    fn send(&self, msg: EngineMessage) {
        self.tx.send(msg).ok();
    }

    fn log(&self, msg: impl Into<String>) {
        let msg = msg.into();
        info!("{msg}");
        self.send(EngineMessage::Log(msg));
    }

    fn handle(&mut self, cmd: GuiCommand) {
        match cmd {
            GuiCommand::RefreshPorts => self.refresh_ports(),
            GuiCommand::Connect { mode, port, baud } => self.connect(mode, &port, baud),
            GuiCommand::Disconnect => self.disconnect(),
            GuiCommand::SetBaudRate(baud) => {
                if let Some(source) = self.source.as_mut() {
                    if let Err(e) = source.set_baud_rate(baud) {
                        self.log(format!("❌ Baud rate change failed: {e}"));
                    }
                }
            }
            GuiCommand::SetDelimiter(text) => self.set_delimiter(&text),
            GuiCommand::ToggleIngestion => self.toggle_ingestion(),
            GuiCommand::SetCalibration { index, value } => {
                if self.pipeline.set_calibration(index, &value) {
                    self.send(EngineMessage::Calibration(self.pipeline.calibration().snapshot()));
                } else {
                    self.log(format!("⚠️ Ignored factor {value:?} for Input {}", index + 1));
                }
            }
            GuiCommand::Export { filename, file_type } => match self.pipeline.save(&filename, file_type) {
                Ok(path) => {
                    self.log(format!("💾 Saved {}", path.display()));
                    self.send(EngineMessage::Exported(path));
                }
                Err(e) => {
                    warn!("{e}");
                    self.send(EngineMessage::ExportFailed(e.to_string()));
                }
            },
        }
    }

    fn refresh_ports(&self) {
        match available_ports() {
            Ok(ports) => self.send(EngineMessage::Ports(ports)),
            Err(e) => self.log(format!("❌ Port scan failed: {e}")),
        }
    }

    fn connect(&mut self, mode: ConnectionMode, port: &str, baud: u32) {
        // 已经打开的端口先关闭
        if self.source.is_some() {
            self.disconnect();
        }
        let timeout = self.config.read_timeout();
        let source: BoxedSource = match mode {
            ConnectionMode::Simulation => self.simulator(),
            ConnectionMode::Hardware => match SerialSession::open(port, baud, timeout) {
                Ok(session) => Box::new(session),
                Err(e) => {
                    self.log(format!("❌ Connect Failed: {e}"));
                    return;
                }
            },
        };
        self.source = Some(source);
        self.simulated = mode == ConnectionMode::Simulation;
        self.send(EngineMessage::Status(true));
        match mode {
            ConnectionMode::Simulation => self.log("✅ Sim Connected"),
            ConnectionMode::Hardware => self.log(format!("✅ {port} Connected @ {baud}")),
        }
        if self.pipeline.delimiter().is_some() {
            self.bootstrap();
        }
    }

    /// 模拟器使用当前分隔符，未设置时退回配置值
    fn simulator(&self) -> BoxedSource {
        let sim = &self.config.simulation;
        let delimiter = self
            .pipeline
            .delimiter()
            .map(|d| d.as_str().to_owned())
            .unwrap_or_else(|| self.config.delimiter.clone());
        Box::new(SimulatedSource::new(
            delimiter,
            sim.channels,
            sim.period(),
            self.config.read_timeout(),
            sim.glitch_rate,
            sim.seed,
        ))
    }

    fn disconnect(&mut self) {
        self.pipeline.halt();
        self.source = None;
        self.simulated = false;
        self.send(EngineMessage::Ingesting(false));
        self.send(EngineMessage::Status(false));
        self.log("🔌 Disconnected");
    }

    fn set_delimiter(&mut self, text: &str) {
        match self.pipeline.set_delimiter(text) {
            Ok(delimiter) => {
                let msg = format!("Delimiter set to {:?}", delimiter.as_str());
                self.log(msg);
                self.send(EngineMessage::DelimiterReady(true));
                if self.simulated {
                    self.source = Some(self.simulator());
                }
                if self.source.is_some() {
                    self.bootstrap();
                }
            }
            Err(e @ ParserError::DelimiterLocked) => self.log(format!("⚠️ {e}")),
            Err(e) => {
                self.log(format!("❌ {e}"));
                self.send(EngineMessage::DelimiterReady(self.pipeline.delimiter().is_some()));
            }
        }
    }

    fn bootstrap(&mut self) {
        let Some(source) = self.source.as_mut() else { return };
        match self.pipeline.bootstrap(source) {
            Ok(primed) => {
                self.forward_steps(&primed.steps);
                self.send(EngineMessage::Calibration(self.pipeline.calibration().snapshot()));
                self.log(format!("📏 Detected {} channel(s)", primed.channel_count));
            }
            Err(e) => self.log(format!("❌ Calibration bootstrap failed: {e}")),
        }
    }

    fn toggle_ingestion(&mut self) {
        let Some(source) = self.source.as_mut() else {
            self.log("Connect first.");
            return;
        };
        match self.pipeline.toggle_ingestion(source) {
            Ok(on) => {
                self.send(EngineMessage::Ingesting(on));
                self.log(if on { "🌊 Parsing Started" } else { "🛑 Parsing Stopped" });
            }
            Err(e) => self.log(format!("❌ {e}")),
        }
    }

    fn forward_steps(&self, steps: &[ResizeStep]) {
        for step in steps {
            match *step {
                ResizeStep::Added(index) => self.send(EngineMessage::ChannelAdded(index)),
                ResizeStep::Removed(index) => self.send(EngineMessage::ChannelRemoved(index)),
            }
        }
    }

    /// 返回 true 表示本轮尝试过读取
    fn tick(&mut self) -> bool {
        if !self.pipeline.is_ingesting() {
            return false;
        }
        let Some(source) = self.source.as_mut() else { return false };
        match self.pipeline.pump_once(source) {
            Ok(Tick::Parsed(ingested)) => {
                if !ingested.steps.is_empty() {
                    self.forward_steps(&ingested.steps);
                    self.send(EngineMessage::Calibration(self.pipeline.calibration().snapshot()));
                }
                let window = self.pipeline.window(self.config.window_size).to_vec();
                self.send(EngineMessage::Window(window));
            }
            Ok(Tick::Skipped) | Ok(Tick::Paused) => {}
            Err(e) => {
                warn!("ingestion halted: {e}");
                self.pipeline.halt();
                self.send(EngineMessage::Ingesting(false));
                self.log(format!("❌ Read failed, parsing stopped: {e}"));
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FileType;
    use std::sync::mpsc::channel;

    fn engine() -> (Engine, Receiver<EngineMessage>) {
        let (tx, rx) = channel();
        let mut config = AppConfig::default();
        config.simulation.period_ms = 0;
        config.simulation.glitch_rate = 0.0;
        config.simulation.seed = Some(3);
        (Engine::new(config, tx), rx)
    }

    #[test]
    fn simulated_session_flows_through_pipeline() {
        let (mut engine, rx) = engine();
        engine.handle(GuiCommand::SetDelimiter(",".into()));
        engine.handle(GuiCommand::Connect {
            mode: ConnectionMode::Simulation,
            port: String::new(),
            baud: 9600,
        });
        assert_eq!(engine.pipeline.calibration().len(), 4);
        engine.handle(GuiCommand::ToggleIngestion);
        for _ in 0..5 {
            assert!(engine.tick());
        }
        assert_eq!(engine.pipeline.log().len(), 5);

        let msgs: Vec<EngineMessage> = rx.try_iter().collect();
        let added = msgs.iter().filter(|m| matches!(m, EngineMessage::ChannelAdded(_))).count();
        assert_eq!(added, 4);
        assert!(msgs.iter().any(|m| matches!(m, EngineMessage::Ingesting(true))));
        let windows = msgs.iter().filter(|m| matches!(m, EngineMessage::Window(_))).count();
        assert_eq!(windows, 5);
    }

    fn connect_simulation(engine: &mut Engine) {
        engine.handle(GuiCommand::Connect {
            mode: ConnectionMode::Simulation,
            port: String::new(),
            baud: 9600,
        });
    }

    fn logged_lines(engine: &Engine) -> Vec<usize> {
        engine.pipeline.log().lines().iter().map(|l| l.num_channels()).collect()
    }

    #[test]
    fn simulated_session_follows_configured_delimiter() {
        let (mut engine, _rx) = engine();
        engine.handle(GuiCommand::SetDelimiter(";".into()));
        connect_simulation(&mut engine);
        assert_eq!(engine.pipeline.calibration().len(), 4);
        engine.handle(GuiCommand::ToggleIngestion);
        for _ in 0..3 {
            assert!(engine.tick());
        }
        assert_eq!(logged_lines(&engine), vec![4, 4, 4]);
    }

    #[test]
    fn delimiter_change_while_simulating_rebuilds_source() {
        let (mut engine, _rx) = engine();
        connect_simulation(&mut engine);
        engine.handle(GuiCommand::SetDelimiter("|".into()));
        assert_eq!(engine.pipeline.calibration().len(), 4);
        engine.handle(GuiCommand::ToggleIngestion);
        assert!(engine.tick());
        engine.handle(GuiCommand::ToggleIngestion);
        engine.handle(GuiCommand::SetDelimiter("::".into()));
        assert_eq!(engine.pipeline.calibration().len(), 4);
        engine.handle(GuiCommand::ToggleIngestion);
        assert!(engine.tick());
        assert_eq!(logged_lines(&engine), vec![4, 4]);
    }

    #[test]
    fn toggle_without_connection_is_refused() {
        let (mut engine, _rx) = engine();
        engine.handle(GuiCommand::SetDelimiter(",".into()));
        engine.handle(GuiCommand::ToggleIngestion);
        assert!(!engine.pipeline.is_ingesting());
        assert!(!engine.tick());
    }

    #[test]
    fn export_failure_is_reported() {
        let (mut engine, rx) = engine();
        let dir = tempfile::tempdir().unwrap();
        let filename = dir.path().join("no_such_dir").join("out");
        engine.handle(GuiCommand::Export {
            filename: filename.to_string_lossy().into_owned(),
            file_type: FileType::Json,
        });
        assert!(rx.try_iter().any(|m| matches!(m, EngineMessage::ExportFailed(_))));
    }

    #[test]
    fn disconnect_stops_ingestion() {
        let (mut engine, _rx) = engine();
        engine.handle(GuiCommand::SetDelimiter(",".into()));
        engine.handle(GuiCommand::Connect {
            mode: ConnectionMode::Simulation,
            port: String::new(),
            baud: 9600,
        });
        engine.handle(GuiCommand::ToggleIngestion);
        engine.handle(GuiCommand::Disconnect);
        assert!(!engine.pipeline.is_ingesting());
        assert!(!engine.tick());
    }
}
