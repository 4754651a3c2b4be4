use crate::core::{Color, Dashboard, Figure};
use tracing::debug;

pub fn dash() -> DashBuilder {
    DashBuilder {
        dash: Dashboard::default(),
    }
}

pub struct DashBuilder {
    dash: Dashboard,
}

impl DashBuilder {
    pub fn background_color(mut self, c: Color) -> Self {
        self.dash.background = c;
        self
    }

    /// Set the number of columns per row (default: auto based on figure count)
    pub fn columns(mut self, cols: usize) -> Self {
        self.dash.columns = Some(cols.max(1));
        self
    }

    /// Append a figure; tiles follow insertion order.
    pub fn add(mut self, figure: impl Into<Figure>) -> Self {
        let figure = figure.into();
        debug!(
            index = self.dash.figures.len(),
            id = ?figure.id(),
            title = ?figure.meta().title,
            "figure added to dashboard"
        );
        self.dash.figures.push(figure);
        self
    }

    pub fn build(self) -> Dashboard {
        self.dash
    }

    /// Run the dashboard locally using Bevy (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run_local(self) {
        crate::runtime::run_dashboard(self.dash);
    }
}

impl Dashboard {
    /// Window title: the first figure's window title, then its title.
    pub fn window_title(&self) -> String {
        self.figures
            .iter()
            .find_map(|f| {
                let meta = f.meta();
                meta.window_title.clone().or_else(|| meta.title.clone())
            })
            .unwrap_or_else(|| "figkit".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Canvas2D, Canvas3D, FigureMeta};

    #[test]
    fn builder_keeps_order_and_settings() {
        let d = dash()
            .background_color(Color::grey(0.9))
            .columns(0)
            .add(Canvas2D::new().x_label("first"))
            .add(Canvas3D::new())
            .build();
        assert_eq!(d.background, Color::grey(0.9));
        assert_eq!(d.columns, Some(1));
        assert_eq!(d.figures.len(), 2);
        assert_eq!(
            d.figures[0].as_2d().and_then(|c| c.x_label.as_deref()),
            Some("first")
        );
        assert!(d.figures[1].as_3d().is_some());
    }

    #[test]
    fn window_title_prefers_window_then_figure_title() {
        let titled = |title: Option<&str>, window: Option<&str>| {
            Canvas2D::new().meta(FigureMeta {
                title: title.map(String::from),
                window_title: window.map(String::from),
                ..FigureMeta::default()
            })
        };
        assert_eq!(dash().build().window_title(), "figkit");
        assert_eq!(
            dash().add(titled(Some("Plot"), None)).build().window_title(),
            "Plot"
        );
        assert_eq!(
            dash()
                .add(titled(None, None))
                .add(titled(Some("Plot"), Some("Window")))
                .build()
                .window_title(),
            "Window"
        );
    }
}
