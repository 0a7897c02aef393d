//! Admin dashboard bodies.

use agapay_core::dashboard::{
    AdminDashboard, ChartView, InventorySnapshot, SyndromicTrendPoint, TelehealthCase, Urgency,
};
use agapay_types::RiskLevel;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRes {
    pub name: String,
    pub cases: u32,
    pub stock: u32,
    pub predicted_demand: u32,
    /// `LOW`, `MED` or `HIGH`.
    pub urgency: String,
}

impl From<&InventorySnapshot> for InventoryRes {
    fn from(item: &InventorySnapshot) -> Self {
        Self {
            name: item.name.clone(),
            cases: item.cases,
            stock: item.stock,
            predicted_demand: item.predicted_demand,
            urgency: match item.urgency {
                Urgency::Low => "LOW".into(),
                Urgency::Med => "MED".into(),
                Urgency::High => "HIGH".into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrendPointRes {
    pub day: String,
    pub fever: u32,
    pub cough: u32,
}

impl From<&SyndromicTrendPoint> for TrendPointRes {
    fn from(point: &SyndromicTrendPoint) -> Self {
        Self {
            day: point.day.clone(),
            fever: point.fever,
            cough: point.cough,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelehealthCaseRes {
    pub id: u32,
    pub name: String,
    pub age: u32,
    pub risk: RiskLevel,
    pub condition: String,
    pub wait_time: String,
}

impl From<&TelehealthCase> for TelehealthCaseRes {
    fn from(case: &TelehealthCase) -> Self {
        Self {
            id: case.id,
            name: case.name.clone(),
            age: case.age,
            risk: case.risk,
            condition: case.condition.clone(),
            wait_time: case.wait_time.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartSeriesRes {
    pub name: String,
    pub values: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartViewRes {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeriesRes>,
}

impl From<ChartView> for ChartViewRes {
    fn from(view: ChartView) -> Self {
        Self {
            title: view.title,
            categories: view.categories,
            series: view
                .series
                .into_iter()
                .map(|s| ChartSeriesRes {
                    name: s.name,
                    values: s.values,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRes {
    pub inventory: Vec<InventoryRes>,
    pub trend: Vec<TrendPointRes>,
    pub resource_chart: ChartViewRes,
    pub trend_chart: ChartViewRes,
    /// Telehealth queue, most urgent first.
    pub triage_queue: Vec<TelehealthCaseRes>,
    pub report: Option<String>,
    pub report_pending: bool,
}

impl From<&AdminDashboard> for DashboardRes {
    fn from(dashboard: &AdminDashboard) -> Self {
        let data = dashboard.data();
        Self {
            inventory: data.inventory.iter().map(InventoryRes::from).collect(),
            trend: data.trend.iter().map(TrendPointRes::from).collect(),
            resource_chart: dashboard.resource_chart().into(),
            trend_chart: dashboard.trend_chart().into(),
            triage_queue: dashboard
                .triage_queue()
                .iter()
                .map(TelehealthCaseRes::from)
                .collect(),
            report: dashboard.report().map(str::to_string),
            report_pending: dashboard.is_pending(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportRes {
    /// Markdown executive summary, or the fixed fallback text.
    pub report: String,
}
