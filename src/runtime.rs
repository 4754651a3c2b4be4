use bevy::prelude::*;

use crate::core::Dashboard;
use crate::render::{DashboardRes, FigureRenderPlugin};

#[cfg(not(target_arch = "wasm32"))]
pub fn run_dashboard(dashboard: Dashboard) {
    let bg = dashboard.background;
    let title = dashboard.window_title();
    App::new()
        .insert_resource(ClearColor(Color::srgb(bg.r, bg.g, bg.b)))
        .insert_resource(DashboardRes::new(dashboard))
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title,
                    ..default()
                }),
                ..default()
            }),
            FigureRenderPlugin,
        ))
        .run();
}

#[cfg(target_arch = "wasm32")]
pub fn run_dashboard(dashboard: Dashboard, canvas_id: &str) {
    let bg = dashboard.background;
    let title = dashboard.window_title();
    App::new()
        .insert_resource(ClearColor(Color::srgb(bg.r, bg.g, bg.b)))
        .insert_resource(DashboardRes::new(dashboard))
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title,
                    canvas: Some(format!("#{}", canvas_id)),
                    fit_canvas_to_parent: true,
                    ..default()
                }),
                ..default()
            }),
            FigureRenderPlugin,
        ))
        .run();
}
