use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber shared by every glyphidx binary.
///
/// The packer reports `pack_start`, `pack_plan`, `pack_empty_subset` and
/// `pack_complete`; the tools report `embed_complete`, `view_sample` and
/// `view_label_out_of_policy`. All events use `target: "glyphidx"` with an
/// `event` field, so `GLYPHIDX_LOG=glyphidx=warn` keeps only empty-subset and
/// label-range warnings. stdout carries only tool output (summaries, dumps,
/// offsets).
pub fn init_tracing() {
    let filter = env_filter();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `GLYPHIDX_LOG`, then `RUST_LOG`, then `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("GLYPHIDX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
