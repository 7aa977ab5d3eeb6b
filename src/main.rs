mod app;
mod ir;
mod load;
mod util;

use clap::Parser;

use crate::load::{
    DEFAULT_GRAPH_DOCUMENT, DEFAULT_NBEST_DOCUMENT, DEFAULT_TRACE_DOCUMENT, DocumentPaths,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document (path or http(s) URL).
    #[arg(long, default_value = DEFAULT_GRAPH_DOCUMENT)]
    graph: String,
    /// Rewrite trace document; optional at load time.
    #[arg(long, default_value = DEFAULT_TRACE_DOCUMENT)]
    trace: String,
    /// N-best candidate document; optional at load time.
    #[arg(long, default_value = DEFAULT_NBEST_DOCUMENT)]
    nbest: String,
    /// Start with the layout simulation paused.
    #[arg(long)]
    no_physics: bool,
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let paths = DocumentPaths {
        graph: args.graph,
        trace: args.trace,
        nbest: args.nbest,
    };
    let live_physics = !args.no_physics;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Witness Studio",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::WitnessStudioApp::new(
                cc,
                paths.clone(),
                live_physics,
            )))
        }),
    )
}
