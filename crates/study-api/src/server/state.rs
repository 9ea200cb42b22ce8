#[derive(Clone)]
struct AppState {
    inner: std::sync::Arc<Mutex<SessionRegistry>>,
}

impl AppState {
    fn new() -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(SessionRegistry::new())),
        }
    }
}
