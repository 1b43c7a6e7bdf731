use std::sync::Arc;
use tutor_service::config::TutorConfig;
use tutor_service::services::providers::mock::MockTextProvider;
use tutor_service::services::ConversationDb;
use tutor_service::startup::Application;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: ConversationDb,
    pub db_name: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");
        std::env::set_var("GOOGLE_API_KEY", "test-api-key");

        let db_name = format!("tutor_test_{}", Uuid::new_v4().simple());

        let mut config = TutorConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.mongodb.database = db_name.clone();

        let app = Application::build_with_provider(config, Arc::new(MockTextProvider::new(true)))
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
        }
    }

    pub fn conversation_url(&self, session_id: &str) -> String {
        format!("{}/api/conversation/{}", self.address, session_id)
    }

    pub fn problem_solver_url(&self) -> String {
        format!("{}/api/conversation/problem-solver", self.address)
    }

    /// Cleanup test resources (drops the per-test database).
    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
    }
}

/// Encode a solid-color JPEG of the given dimensions for upload tests.
#[allow(dead_code)]
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([20, 90, 160])));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageOutputFormat::Jpeg(90))
        .expect("Failed to encode test JPEG");
    buffer.into_inner()
}
