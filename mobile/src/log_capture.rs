use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Number of formatted lines kept for crash reports
pub const LOG_CAPTURE_CAPACITY: usize = 200;

/// Bounded ring of formatted log lines
pub struct LogBuffer {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a line, dropping the oldest once the buffer is full
    pub fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == self.capacity {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    /// Captured lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }
}

static LOG_BUFFER: OnceLock<LogBuffer> = OnceLock::new();

fn log_buffer() -> &'static LogBuffer {
    LOG_BUFFER.get_or_init(|| LogBuffer::new(LOG_CAPTURE_CAPACITY))
}

pub fn append_log(line: String) {
    log_buffer().push(line);
}

/// Lines captured by [`LogCaptureLayer`], oldest first
pub fn recent_logs() -> Vec<String> {
    log_buffer().lines()
}

pub struct LogCaptureLayer;

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        struct MessageVisitor {
            message: String,
        }

        impl tracing::field::Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{:?}", value);
                }
            }

            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = value.to_string();
                }
            }
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
        };

        event.record(&mut visitor);

        append_log(format!(
            "[{}] {}: {}",
            metadata.level(),
            metadata.target(),
            visitor.message
        ));
    }
}

// Type-erased reload handle using a closure
type ReloadFn = Box<dyn Fn(&str) + Send + Sync>;

// Global reload handle for dynamic log level changes
static RELOAD_HANDLE: OnceLock<Arc<RwLock<Option<ReloadFn>>>> = OnceLock::new();

fn get_reload_handle() -> &'static Arc<RwLock<Option<ReloadFn>>> {
    RELOAD_HANDLE.get_or_init(|| Arc::new(RwLock::new(None)))
}

/// Store the reload handle for later use (type-erased)
pub fn set_reload_fn<F>(reload_fn: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    if let Ok(mut handle) = get_reload_handle().write() {
        *handle = Some(Box::new(reload_fn));
    }
}

/// Update the tracing log level at runtime
pub fn update_tracing_level(level: &str) {
    if let Ok(handle) = get_reload_handle().read() {
        if let Some(ref reload_fn) = *handle {
            reload_fn(level);
        }
    }
}
