use async_trait::async_trait;
use mockall::mock;
use toggl_entries::transport::{ApiRequest, Transport};
use toggl_entries::TransportError;

mock! {
    pub Api {}

    #[async_trait]
    impl Transport for Api {
        async fn send(&self, request: ApiRequest) -> Result<Vec<u8>, TransportError>;
    }
}
