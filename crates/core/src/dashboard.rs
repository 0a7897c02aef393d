//! Admin dashboard over fixed mock datasets.
//!
//! Inventory, syndromic trend and the telehealth queue come from a bundled YAML fixture. The only
//! outbound call is the logistics report, built from the datasets currently on display.

use crate::{AgapayError, AgapayResult};
use agapay_gateway::AgapayAssistant;
use agapay_types::RiskLevel;
use serde::{Deserialize, Serialize};
use tracing::info;

const DASHBOARD_YAML: &str = include_str!("../fixtures/dashboard.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Low,
    Med,
    High,
}

/// Medicine stock and forecast for one barangay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub name: String,
    pub cases: u32,
    pub stock: u32,
    pub predicted_demand: u32,
    pub urgency: Urgency,
}

impl InventorySnapshot {
    pub fn shortfall(&self) -> u32 {
        self.predicted_demand.saturating_sub(self.stock)
    }
}

/// Daily case counts for the tracked syndromes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyndromicTrendPoint {
    pub day: String,
    pub fever: u32,
    pub cough: u32,
}

/// A patient waiting for a teleconsult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelehealthCase {
    pub id: u32,
    pub name: String,
    pub age: u32,
    pub risk: RiskLevel,
    pub condition: String,
    pub wait_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub inventory: Vec<InventorySnapshot>,
    pub trend: Vec<SyndromicTrendPoint>,
    pub telehealth_queue: Vec<TelehealthCase>,
}

impl DashboardData {
    /// The bundled mock datasets.
    pub fn mock() -> AgapayResult<Self> {
        serde_yaml::from_str(DASHBOARD_YAML).map_err(AgapayError::YamlDeserialization)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<u32>,
}

/// Categories along the x axis with one or more named series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Current stock against predicted demand, per barangay.
pub fn resource_chart(inventory: &[InventorySnapshot]) -> ChartView {
    ChartView {
        title: "Resource Allocation vs Predicted Demand".into(),
        categories: inventory.iter().map(|i| i.name.clone()).collect(),
        series: vec![
            ChartSeries {
                name: "Current Stock".into(),
                values: inventory.iter().map(|i| i.stock).collect(),
            },
            ChartSeries {
                name: "Predicted Demand".into(),
                values: inventory.iter().map(|i| i.predicted_demand).collect(),
            },
        ],
    }
}

pub fn trend_chart(trend: &[SyndromicTrendPoint]) -> ChartView {
    ChartView {
        title: "Syndromic Surveillance".into(),
        categories: trend.iter().map(|p| p.day.clone()).collect(),
        series: vec![
            ChartSeries {
                name: "Fever".into(),
                values: trend.iter().map(|p| p.fever).collect(),
            },
            ChartSeries {
                name: "Cough".into(),
                values: trend.iter().map(|p| p.cough).collect(),
            },
        ],
    }
}

/// Queue ordered by risk, most urgent first. Equal risks keep their fixture order.
pub fn triage_queue(cases: &[TelehealthCase]) -> Vec<TelehealthCase> {
    let mut queue = cases.to_vec();
    queue.sort_by(|a, b| b.risk.cmp(&a.risk));
    queue
}

pub struct AdminDashboard {
    data: DashboardData,
    report: Option<String>,
    pending: bool,
}

impl AdminDashboard {
    pub fn new(data: DashboardData) -> Self {
        Self {
            data,
            report: None,
            pending: false,
        }
    }

    pub fn data(&self) -> &DashboardData {
        &self.data
    }

    pub fn resource_chart(&self) -> ChartView {
        resource_chart(&self.data.inventory)
    }

    pub fn trend_chart(&self) -> ChartView {
        trend_chart(&self.data.trend)
    }

    pub fn triage_queue(&self) -> Vec<TelehealthCase> {
        triage_queue(&self.data.telehealth_queue)
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Disable the report button, clear the previous report and snapshot the displayed datasets.
    pub fn begin_report(
        &mut self,
    ) -> AgapayResult<(Vec<InventorySnapshot>, Vec<SyndromicTrendPoint>)> {
        if self.pending {
            return Err(AgapayError::Busy("logistics report"));
        }
        self.pending = true;
        self.report = None;
        Ok((self.data.inventory.clone(), self.data.trend.clone()))
    }

    pub fn complete_report(&mut self, text: String) -> AgapayResult<&str> {
        if !self.pending {
            return Err(AgapayError::InvalidTransition {
                action: "complete a report",
                step: "idle",
            });
        }
        self.pending = false;
        info!("logistics report ready ({} chars)", text.len());
        Ok(self.report.insert(text).as_str())
    }

    pub async fn generate_report(&mut self, assistant: &AgapayAssistant) -> AgapayResult<&str> {
        let (inventory, trend) = self.begin_report()?;
        let text = assistant.logistics_intel(&inventory, &trend).await;
        self.complete_report(text)
    }

    pub fn dismiss_report(&mut self) {
        self.report = None;
    }
}
