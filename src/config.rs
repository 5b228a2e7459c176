use is_terminal::IsTerminal;

pub const SINGLE_THREADED_ENV: &str = "KEEL_SINGLE_THREADED";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadingMode {
    /// One rayon task per source file.
    #[default]
    Parallel,
    SingleThreaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub threading: ThreadingMode,
    pub use_colors: bool,
    /// Print the diagnostics of every invalid file as it finishes.
    pub report_diagnostics: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            threading: ThreadingMode::default(),
            use_colors: std::io::stderr().is_terminal(),
            report_diagnostics: false,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with `KEEL_SINGLE_THREADED=1` (or `true`) selecting single threaded resolution.
    pub fn from_env() -> Self {
        let single = std::env::var(SINGLE_THREADED_ENV).ok();
        Self::default().with_threading(threading_from(single.as_deref()))
    }

    pub fn with_threading(mut self, threading: ThreadingMode) -> Self {
        self.threading = threading;
        self
    }

    pub fn single_threaded(self) -> Self {
        self.with_threading(ThreadingMode::SingleThreaded)
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_diagnostics_reported(mut self, report_diagnostics: bool) -> Self {
        self.report_diagnostics = report_diagnostics;
        self
    }
}

fn threading_from(value: Option<&str>) -> ThreadingMode {
    match value.map(str::trim) {
        Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => ThreadingMode::SingleThreaded,
        _ => ThreadingMode::Parallel,
    }
}
