#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{Clock, SystemClock};
use config::RealtimeConfig;
use infrastructure::Infrastructure;
use reqwest::Client;
use tokio::{net::TcpListener, sync::oneshot, time::sleep};
use tokio_util::sync::CancellationToken;
use web_api::{router, AppState};

pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub shutdown: CancellationToken,
    stop: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// 轮询统计接口直到活跃连接数达到期望值
    pub async fn wait_for_active(&self, expected: u64) {
        for _ in 0..100 {
            let stats: serde_json::Value = self
                .client
                .get(self.http("/api/realtime/stats"))
                .send()
                .await
                .expect("stats request")
                .json()
                .await
                .expect("stats json");
            if stats["active"].as_u64() == Some(expected) {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("active connections never reached {expected}");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

pub async fn spawn_server() -> TestServer {
    let realtime = RealtimeConfig::default();
    let infra = Infrastructure::in_memory(&realtime);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let shutdown = CancellationToken::new();
    let state = AppState::from_infrastructure(&infra, clock, shutdown.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
            .ok();
    });

    TestServer {
        addr,
        client: Client::new(),
        shutdown,
        stop: Some(stop_tx),
    }
}
