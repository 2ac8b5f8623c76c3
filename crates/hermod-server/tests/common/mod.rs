//! Common utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use hermod_server::error::ToolResult;
use hermod_server::weather::{CurrentWeather, DailyWeather, HourlyWeather};
use hermod_server::{
    GitCli, JsonTaskStore, JsonTicketStore, Server, ToolCatalog, WeatherService,
};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Canned weather so tests never touch the network.
pub struct StaticWeather;

#[async_trait]
impl WeatherService for StaticWeather {
    async fn coordinates(&self, city: &str) -> ToolResult<Option<(f64, f64)>> {
        Ok((city.eq_ignore_ascii_case("tromso")).then_some((69.65, 18.96)))
    }

    async fn current(&self, _lat: f64, _lon: f64) -> ToolResult<CurrentWeather> {
        Ok(CurrentWeather {
            time: "2026-10-19T08:00".to_string(),
            temperature: -2.0,
            weather_code: 71,
            wind_speed: 18.0,
        })
    }

    async fn hourly(&self, _lat: f64, _lon: f64, hours: u32) -> ToolResult<Vec<HourlyWeather>> {
        Ok((0..hours)
            .map(|h| HourlyWeather {
                time: format!("2026-10-19T{:02}:00", h % 24),
                temperature: -1.0,
                weather_code: 3,
                wind_speed: 10.0,
            })
            .collect())
    }

    async fn daily(&self, _lat: f64, _lon: f64, _date: &str) -> ToolResult<Option<DailyWeather>> {
        Ok(None)
    }
}

/// A tool server running in the background on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub temp_dir: TempDir,
    _handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let catalog = ToolCatalog::new(
            Arc::new(StaticWeather),
            Arc::new(GitCli::new(None)),
            Arc::new(JsonTicketStore::new(temp_dir.path().join("tickets.json"))),
            Arc::new(JsonTaskStore::new(temp_dir.path().join("tasks.json"))),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = Server::new(Arc::new(catalog));
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        Ok(Self {
            addr,
            temp_dir,
            _handle: handle,
        })
    }

    pub fn mcp_url(&self) -> String {
        format!("http://{}/mcp", self.addr)
    }
}
