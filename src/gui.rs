// src/gui.rs
use eframe::egui;
use egui::Color32;
use egui_plot::{Line, Plot, PlotPoints};
use std::sync::mpsc::{channel, Receiver, Sender};
use crate::config::AppConfig;
use crate::engine;
use crate::parser::{FileType, ParsedLine};
use crate::types::*;

const CHANNEL_COLORS: [Color32; 8] = [
    Color32::from_rgb(0, 255, 255),
    Color32::YELLOW,
    Color32::from_rgb(255, 0, 255),
    Color32::from_rgb(0, 255, 120),
    Color32::from_rgb(255, 140, 0),
    Color32::from_rgb(120, 160, 255),
    Color32::RED,
    Color32::WHITE,
];

pub struct SerialParserApp {
    // 系统状态
    is_connected: bool,
    is_ingesting: bool,
    delimiter_ready: bool,
    connection_mode: ConnectionMode,

    // 串口设置
    ports: Vec<String>,
    selected_port: String,
    baud_rates: Vec<u32>,
    selected_baud: u32,
    delimiter_input: String,

    // 校准 (下拉框选项与后台逐个同步)
    channel_options: Vec<String>,
    selected_channel: Option<usize>,
    calibration: Vec<f64>,
    factor_input: String,

    // 显示窗口
    window: Vec<ParsedLine>,

    // 导出
    export_filename: String,
    file_type: FileType,

    // 界面日志
    log_messages: Vec<String>,

    // 通讯管道
    rx: Receiver<EngineMessage>,
    tx_cmd: Sender<GuiCommand>,
}

impl SerialParserApp {
    pub fn new(config: AppConfig) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();

        let selected_baud = config.default_baud;
        let baud_rates = config.baud_rates.clone();
        let delimiter_input = config.delimiter.clone();
        let export_filename = config.export_filename.clone();

        // 启动后台引擎
        engine::spawn_thread(config, tx, rx_cmd);

        Self {
            is_connected: false, is_ingesting: false, delimiter_ready: false,
            connection_mode: ConnectionMode::Hardware,
            ports: Vec::new(), selected_port: String::new(),
            baud_rates, selected_baud, delimiter_input,
            channel_options: Vec::new(), selected_channel: None,
            calibration: Vec::new(), factor_input: String::new(),
            window: Vec::new(),
            export_filename, file_type: FileType::Csv,
            log_messages: vec!["Serial Parser Ready.".to_owned()],
            rx, tx_cmd,
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 { self.log_messages.remove(0); }
    }

    fn send(&self, cmd: GuiCommand) {
        self.tx_cmd.send(cmd).ok();
    }

    fn apply_message(&mut self, msg: EngineMessage) {
        match msg {
            EngineMessage::Log(s) => self.log(&s),
            EngineMessage::Ports(ports) => {
                if !ports.contains(&self.selected_port) {
                    self.selected_port = ports.first().cloned().unwrap_or_default();
                }
                self.ports = ports;
            }
            EngineMessage::Status(b) => self.is_connected = b,
            EngineMessage::DelimiterReady(b) => self.delimiter_ready = b,
            EngineMessage::Ingesting(b) => self.is_ingesting = b,
            EngineMessage::ChannelAdded(index) => {
                self.channel_options.truncate(index);
                self.channel_options.push(format!("Input {}", index + 1));
            }
            EngineMessage::ChannelRemoved(index) => {
                self.channel_options.truncate(index);
                if self.selected_channel.is_some_and(|c| c >= index) {
                    self.selected_channel = None;
                }
            }
            EngineMessage::Calibration(factors) => self.calibration = factors,
            EngineMessage::Window(lines) => self.window = lines,
            EngineMessage::Exported(path) => self.log(&format!("Export OK: {}", path.display())),
            EngineMessage::ExportFailed(e) => self.log(&format!("❌ Export Failed: {}", e)),
        }
    }

    fn connection_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.connection_mode, ConnectionMode::Simulation, "SIM");
            ui.selectable_value(&mut self.connection_mode, ConnectionMode::Hardware, "REAL");
        });

        if self.connection_mode == ConnectionMode::Hardware {
            let port_text = if self.selected_port.is_empty() { "(no port)".to_owned() } else { self.selected_port.clone() };
            ui.horizontal(|ui| {
                egui::ComboBox::from_id_source("port_combo")
                    .selected_text(port_text)
                    .show_ui(ui, |ui| {
                        for p in &self.ports {
                            ui.selectable_value(&mut self.selected_port, p.clone(), p.as_str());
                        }
                    });
                if ui.button("🔄").clicked() { self.send(GuiCommand::RefreshPorts); }
            });
        }

        let before = self.selected_baud;
        egui::ComboBox::from_id_source("baud_combo")
            .selected_text(format!("{} baud", self.selected_baud))
            .show_ui(ui, |ui| {
                for rate in &self.baud_rates {
                    ui.selectable_value(&mut self.selected_baud, *rate, format!("{} baud", rate));
                }
            });
        if self.selected_baud != before && self.is_connected {
            self.send(GuiCommand::SetBaudRate(self.selected_baud));
        }

        let btn_txt = if self.is_connected { "DISCONNECT" } else { "CONNECT" };
        let can_connect = self.is_connected
            || self.connection_mode == ConnectionMode::Simulation
            || !self.selected_port.is_empty();
        if ui.add_enabled(can_connect, egui::Button::new(btn_txt)).clicked() {
            if !self.is_connected {
                self.send(GuiCommand::Connect {
                    mode: self.connection_mode,
                    port: self.selected_port.clone(),
                    baud: self.selected_baud,
                });
            } else {
                self.send(GuiCommand::Disconnect);
            }
        }
    }

    fn parsing_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("DELIMITER");
        ui.horizontal(|ui| {
            let resp = ui.add_enabled(
                !self.is_ingesting,
                egui::TextEdit::singleline(&mut self.delimiter_input).desired_width(80.0),
            );
            let entered = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.add_enabled(!self.is_ingesting, egui::Button::new("Apply")).clicked() || entered {
                self.send(GuiCommand::SetDelimiter(self.delimiter_input.clone()));
            }
        });

        let can_parse = self.is_connected && self.delimiter_ready;
        let parse_btn = if self.is_ingesting { "STOP PARSING" } else { "START PARSING" };
        if ui.add_enabled(can_parse, egui::Button::new(parse_btn)).clicked() {
            self.send(GuiCommand::ToggleIngestion);
        }
    }

    fn calibration_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("CONVERSION FACTORS");
        let selected_text = self
            .selected_channel
            .and_then(|i| self.channel_options.get(i).cloned())
            .unwrap_or_else(|| "Select input".to_owned());
        let enabled = !self.channel_options.is_empty();
        ui.add_enabled_ui(enabled, |ui| {
            egui::ComboBox::from_id_source("factor_combo")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (i, name) in self.channel_options.iter().enumerate() {
                        ui.selectable_value(&mut self.selected_channel, Some(i), name.as_str());
                    }
                });
            if let Some(i) = self.selected_channel {
                if let Some(factor) = self.calibration.get(i) {
                    ui.label(format!("current: {}", factor));
                }
            }
            ui.horizontal(|ui| {
                let resp = ui.text_edit_singleline(&mut self.factor_input);
                let entered = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Set").clicked() || entered {
                    if let Some(index) = self.selected_channel {
                        self.send(GuiCommand::SetCalibration { index, value: self.factor_input.clone() });
                    }
                }
            });
        });
    }

    fn export_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("SAVE DATA");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.export_filename).desired_width(140.0));
            egui::ComboBox::from_id_source("file_type_combo")
                .selected_text(self.file_type.extension())
                .show_ui(ui, |ui| {
                    for ft in FileType::ALL {
                        ui.selectable_value(&mut self.file_type, ft, ft.extension());
                    }
                });
        });
        if ui.add_enabled(!self.export_filename.is_empty(), egui::Button::new("💾 SAVE")).clicked() {
            self.send(GuiCommand::Export { filename: self.export_filename.clone(), file_type: self.file_type });
        }
    }

    fn plot_ui(&self, ui: &mut egui::Ui) {
        let channels = self.window.iter().map(|l| l.num_channels()).max().unwrap_or(0);
        Plot::new("scaled_plot")
            .view_aspect(2.0)
            .auto_bounds_x()
            .show(ui, |plot_ui| {
                for ch in 0..channels {
                    let points: Vec<[f64; 2]> = self
                        .window
                        .iter()
                        .enumerate()
                        .filter_map(|(x, line)| line.scaled_values().get(ch).map(|y| [x as f64, *y]))
                        .collect();
                    let col = CHANNEL_COLORS[ch % CHANNEL_COLORS.len()];
                    plot_ui.line(Line::new(PlotPoints::new(points)).name(format!("Input {}", ch + 1)).color(col));
                }
            });
    }
}

impl eframe::App for SerialParserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 消息处理 loop
        // 通道增删必须逐条处理，不能丢
        while let Ok(msg) = self.rx.try_recv() {
            self.apply_message(msg);
        }

        if self.is_ingesting { ctx.request_repaint(); }
        else { ctx.request_repaint_after(std::time::Duration::from_millis(100)); }

        // 2. UI 绘制
        let mut visuals = egui::Visuals::dark();
        visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(10, 10, 15);
        ctx.set_visuals(visuals);

        egui::SidePanel::left("L").min_width(280.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Serial Parser");
            ui.label("Delimited Stream Logger");
            ui.separator();

            self.connection_ui(ui);
            ui.add_space(10.0);
            self.parsing_ui(ui);
            ui.add_space(10.0);
            ui.separator();
            self.calibration_ui(ui);
            ui.add_space(10.0);
            ui.separator();
            self.export_ui(ui);

            ui.add_space(10.0);
            egui::ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
                for m in &self.log_messages { ui.monospace(m); }
            });

            ui.add_space(10.0);
            if ui.button("QUIT").clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.is_connected { ui.label("Connect first."); }
            else if !self.delimiter_ready { ui.label(egui::RichText::new("Enter a delimiter to detect channels").color(Color32::YELLOW)); }

            egui::ScrollArea::vertical().id_source("window_text").max_height(300.0).stick_to_bottom(true).show(ui, |ui| {
                for line in &self.window { ui.monospace(line.display()); }
            });
            ui.separator();
            self.plot_ui(ui);
        });
    }
}
