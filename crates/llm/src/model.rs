pub const GEMINI_PROVIDER_ID: &str = "gemini";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Sampling temperature used when settings do not override it.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Static description of one backend model and its sampling profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: String,
    pub temperature: f64,
    pub max_tokens: Option<u64>,
}

impl Model {
    /// Model `id` with the default temperature and no token cap.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    /// Overrides the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// `None` leaves the cap to the backend.
    pub fn with_max_tokens(mut self, max_tokens: Option<u64>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(DEFAULT_GEMINI_MODEL)
    }
}
