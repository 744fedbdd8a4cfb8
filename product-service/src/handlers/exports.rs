use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::models::Product;
use crate::startup::AppState;

/// Products listed by one seller, newest first.
#[tracing::instrument(skip(state, email))]
pub async fn my_exports(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .store
        .list_by_email(&email)
        .await
        .map_err(|e| e.context("Error fetching your exports"))?;

    Ok(Json(products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryProductStore;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::format::FmtSpan;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn seller_email_is_not_recorded_on_the_span() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_span_events(FmtSpan::NEW)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let state = AppState::new(Arc::new(InMemoryProductStore::new()));
        let Json(products) = my_exports(State(state), Path("seller@example.com".to_string()))
            .await
            .unwrap();
        assert!(products.is_empty());

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("my_exports"));
        assert!(!output.contains("seller@example.com"));
    }
}
