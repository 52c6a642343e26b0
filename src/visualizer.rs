use std::path::Path;

use image::DynamicImage;

use crate::errors::Result;
use crate::prediction::{Class, Prediction};
use crate::traits::Visualizer;

/// RGB used for a bar whose model predicted an accident.
pub const ACCIDENT_COLOR: [u8; 3] = [214, 39, 40];
/// RGB used for every other bar.
pub const SAFE_COLOR: [u8; 3] = [44, 160, 44];

/// One single-bar chart of a model's confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPanel {
    pub model_name: String,
    pub class: Class,
    /// Bar height on a fixed [0, 1] axis.
    pub confidence: f64,
}

impl BarPanel {
    pub fn new(model_name: &str, prediction: &Prediction) -> Self {
        Self {
            model_name: model_name.to_string(),
            class: prediction.class,
            confidence: prediction.confidence,
        }
    }

    pub fn title(&self) -> String {
        format!("{}\n{}", self.model_name, self.class)
    }

    pub const fn color(&self) -> [u8; 3] {
        bar_color(self.class)
    }

    /// Annotation drawn above the bar, e.g. `87.50%`.
    pub fn label(&self) -> String {
        format_percent(self.confidence)
    }

    pub fn height(&self) -> f32 {
        self.confidence.clamp(0.0, 1.0) as f32
    }
}

pub const fn bar_color(class: Class) -> [u8; 3] {
    match class {
        Class::Accident => ACCIDENT_COLOR,
        Class::NonAccident => SAFE_COLOR,
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// The composite figure: the input image on the left, one bar chart per
/// model stacked on the right.
#[derive(Debug, Clone)]
pub struct Figure {
    pub image: DynamicImage,
    pub image_title: String,
    pub panels: [BarPanel; 2],
}

impl Figure {
    pub fn new(
        image_path: &Path,
        image: DynamicImage,
        final_prediction: &Prediction,
        best_prediction: &Prediction,
    ) -> Self {
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| image_path.display().to_string());
        Self {
            image,
            image_title: format!("Input Image\n{}", file_name),
            panels: [
                BarPanel::new("Final Model", final_prediction),
                BarPanel::new("Best Model", best_prediction),
            ],
        }
    }
}

/// Renders figures as text bars on stdout.
#[derive(Debug, Clone)]
pub struct ConsoleVisualizer {
    width: usize,
}

impl Default for ConsoleVisualizer {
    fn default() -> Self {
        Self { width: 40 }
    }
}

impl ConsoleVisualizer {
    pub fn render(&self, figure: &Figure) -> String {
        let mut out = String::new();
        out.push_str(&figure.image_title.replace('\n', ": "));
        out.push_str(&format!(
            " ({}x{})\n",
            figure.image.width(),
            figure.image.height()
        ));
        for panel in &figure.panels {
            out.push_str(&self.render_bar(panel));
            out.push('\n');
        }
        out
    }

    fn render_bar(&self, panel: &BarPanel) -> String {
        let filled = (panel.height() * self.width as f32).round() as usize;
        let glyph = match panel.class {
            Class::Accident => '!',
            Class::NonAccident => '#',
        };
        format!(
            "{:<12} [{}{}] {:>7} {}",
            panel.model_name,
            glyph.to_string().repeat(filled),
            " ".repeat(self.width - filled),
            panel.label(),
            panel.class
        )
    }
}

impl Visualizer for ConsoleVisualizer {
    fn show(&self, figure: &Figure) -> Result<()> {
        println!("{}", self.render(figure));
        Ok(())
    }
}

#[cfg(feature = "gui")]
pub use window::WindowVisualizer;

#[cfg(feature = "gui")]
mod window {
    use eframe::egui::{
        self, Align2, Color32, ColorImage, FontId, Pos2, Rect, Sense, TextureHandle, Vec2,
    };

    use super::{BarPanel, Figure};
    use crate::errors::{DetectorError, Result};
    use crate::traits::Visualizer;

    /// Shows the figure in a native window and blocks until it is closed.
    #[derive(Debug, Default, Clone)]
    pub struct WindowVisualizer;

    impl Visualizer for WindowVisualizer {
        fn show(&self, figure: &Figure) -> Result<()> {
            let options = eframe::NativeOptions {
                viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
                ..Default::default()
            };
            let app = FigureWindow {
                figure: figure.clone(),
                texture: None,
            };
            eframe::run_native(
                "Accident Detection",
                options,
                Box::new(|_cc| Ok(Box::new(app))),
            )
            .map_err(|e| DetectorError::Display {
                reason: e.to_string(),
            })
        }
    }

    struct FigureWindow {
        figure: Figure,
        texture: Option<TextureHandle>,
    }

    impl FigureWindow {
        fn texture(&mut self, ctx: &egui::Context) -> TextureHandle {
            self.texture
                .get_or_insert_with(|| {
                    let rgba = self.figure.image.to_rgba8();
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let color_image = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    ctx.load_texture("input_image", color_image, egui::TextureOptions::LINEAR)
                })
                .clone()
        }
    }

    impl eframe::App for FigureWindow {
        fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
            let texture = self.texture(ctx);

            egui::SidePanel::right("confidence_panels")
                .exact_width(360.0)
                .show(ctx, |ui| {
                    let height = ui.available_height() / 2.0 - 8.0;
                    for panel in &self.figure.panels {
                        draw_bar_chart(ui, panel, Vec2::new(ui.available_width(), height));
                        ui.add_space(8.0);
                    }
                });

            egui::CentralPanel::default().show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    for line in self.figure.image_title.lines() {
                        ui.heading(line);
                    }
                    let max = ui.available_size();
                    let original = texture.size_vec2();
                    let scale = (max.x / original.x).min(max.y / original.y);
                    ui.image((texture.id(), original * scale));
                });
            });
        }
    }

    fn draw_bar_chart(ui: &mut egui::Ui, panel: &BarPanel, size: Vec2) {
        let (response, painter) = ui.allocate_painter(size, Sense::hover());
        let rect = response.rect;
        let text_color = ui.visuals().text_color();

        let title_font = FontId::proportional(16.0);
        painter.text(
            rect.center_top() + Vec2::new(0.0, 4.0),
            Align2::CENTER_TOP,
            panel.title(),
            title_font,
            text_color,
        );

        // Plot area with a fixed [0, 1] y axis.
        let plot = Rect::from_min_max(
            Pos2::new(rect.left() + 48.0, rect.top() + 64.0),
            Pos2::new(rect.right() - 16.0, rect.bottom() - 24.0),
        );
        painter.line_segment(
            [plot.left_bottom(), plot.left_top()],
            (1.0, text_color),
        );
        painter.line_segment(
            [plot.left_bottom(), plot.right_bottom()],
            (1.0, text_color),
        );
        for tick in [0.0_f32, 0.5, 1.0] {
            let y = plot.bottom() - plot.height() * tick;
            painter.text(
                Pos2::new(plot.left() - 6.0, y),
                Align2::RIGHT_CENTER,
                format!("{:.1}", tick),
                FontId::proportional(12.0),
                text_color,
            );
        }
        painter.text(
            Pos2::new(rect.left() + 4.0, plot.center().y),
            Align2::LEFT_CENTER,
            "Confidence",
            FontId::proportional(11.0),
            text_color,
        );

        let [r, g, b] = panel.color();
        let bar_width = plot.width() * 0.5;
        let bar_top = plot.bottom() - plot.height() * panel.height();
        let bar = Rect::from_min_max(
            Pos2::new(plot.center().x - bar_width / 2.0, bar_top),
            Pos2::new(plot.center().x + bar_width / 2.0, plot.bottom()),
        );
        painter.rect_filled(bar, 0.0, Color32::from_rgba_unmultiplied(r, g, b, 178));
        painter.text(
            Pos2::new(bar.center().x, bar_top - 4.0),
            Align2::CENTER_BOTTOM,
            panel.label(),
            FontId::proportional(14.0),
            text_color,
        );
        painter.text(
            Pos2::new(plot.center().x, plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            &panel.model_name,
            FontId::proportional(12.0),
            text_color,
        );
    }
}
