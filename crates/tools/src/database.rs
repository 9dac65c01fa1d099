//! Business database tool: monthly sales, order lookup and the annual
//! summary over a fixed 2024 dataset.

use async_trait::async_trait;
use smartflow_core::error::ToolError;
use smartflow_core::tool::{Tool, ToolResult, required_str};

pub struct DatabaseQueryTool;

struct MonthlySales {
    month: &'static str,
    total: u64,
    orders: u64,
    top_product: &'static str,
    growth: f64,
}

struct Order {
    id: &'static str,
    status: &'static str,
    product: &'static str,
    amount: u64,
    date: &'static str,
}

const SALES: &[MonthlySales] = &[
    MonthlySales { month: "2024-01", total: 1_250_000, orders: 3200, top_product: "智能手表Pro", growth: 12.5 },
    MonthlySales { month: "2024-02", total: 980_000, orders: 2500, top_product: "无线耳机X1", growth: -5.2 },
    MonthlySales { month: "2024-03", total: 1_450_000, orders: 3800, top_product: "智能手表Pro", growth: 48.0 },
    MonthlySales { month: "2024-04", total: 1_320_000, orders: 3500, top_product: "蓝牙音箱S3", growth: -9.0 },
    MonthlySales { month: "2024-05", total: 1_580_000, orders: 4100, top_product: "智能手表Pro", growth: 19.7 },
    MonthlySales { month: "2024-06", total: 1_680_000, orders: 4300, top_product: "无线耳机X2", growth: 6.3 },
    MonthlySales { month: "2024-07", total: 1_420_000, orders: 3600, top_product: "蓝牙音箱S3", growth: -15.5 },
    MonthlySales { month: "2024-08", total: 1_550_000, orders: 4000, top_product: "智能手表Ultra", growth: 9.2 },
    MonthlySales { month: "2024-09", total: 1_890_000, orders: 4800, top_product: "智能手表Ultra", growth: 21.9 },
    MonthlySales { month: "2024-10", total: 2_100_000, orders: 5500, top_product: "智能手表Ultra", growth: 11.1 },
    MonthlySales { month: "2024-11", total: 2_850_000, orders: 7200, top_product: "智能手表Ultra", growth: 35.7 },
    MonthlySales { month: "2024-12", total: 3_200_000, orders: 8500, top_product: "智能手表Ultra", growth: 12.3 },
];

const ORDERS: &[Order] = &[
    Order { id: "ORD-2024-001", status: "已完成", product: "智能手表Pro", amount: 1299, date: "2024-10-15" },
    Order { id: "ORD-2024-002", status: "待发货", product: "无线耳机X2", amount: 599, date: "2024-11-20" },
    Order { id: "ORD-2024-003", status: "已退货", product: "蓝牙音箱S3", amount: 399, date: "2024-11-05" },
    Order { id: "ORD-2024-004", status: "运输中", product: "智能手表Ultra", amount: 2499, date: "2024-12-01" },
];

#[async_trait]
impl Tool for DatabaseQueryTool {
    fn name(&self) -> &str {
        "database_query"
    }

    fn description(&self) -> &str {
        "Query the business database for sales data or order information."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query_type": {
                    "type": "string",
                    "description": "Type of query. Use \"sales\" for sales data (params should be month like \"2024-11\"), \"order\" for order lookup (params should be order ID like \"ORD-2024-001\"), or \"summary\" for annual summary (no params needed)."
                },
                "params": {
                    "type": "string",
                    "description": "Query parameters depending on query_type.",
                    "default": ""
                }
            },
            "required": ["query_type"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query_type = required_str(&arguments, "query_type")?;
        let params = arguments["params"].as_str().unwrap_or("");

        Ok(match query_type {
            "sales" => sales(params.trim()),
            "order" => order(&params.trim().to_uppercase()),
            "summary" => ToolResult::ok(summary()),
            other => ToolResult::miss(format!(
                "不支持的查询类型: {other}。支持的类型: sales, order, summary"
            )),
        })
    }
}

fn sales(month: &str) -> ToolResult {
    match SALES.iter().find(|s| s.month == month) {
        Some(s) => ToolResult::ok(format!(
            "📊 {} 销售数据:\n  总销售额: ¥{}\n  订单数量: {}\n  热销商品: {}\n  环比增长: {:+.1}%",
            s.month,
            thousands(s.total),
            s.orders,
            s.top_product,
            s.growth
        )),
        None => {
            let mut months: Vec<&str> = SALES.iter().map(|s| s.month).collect();
            months.sort_unstable();
            ToolResult::miss(format!(
                "未找到 {month} 的销售数据。可用月份: {}",
                months.join(", ")
            ))
        }
    }
}

fn order(order_id: &str) -> ToolResult {
    match ORDERS.iter().find(|o| o.id == order_id) {
        Some(o) => ToolResult::ok(format!(
            "📦 订单 {} 信息:\n  商品: {}\n  金额: ¥{}\n  状态: {}\n  日期: {}",
            o.id, o.product, o.amount, o.status, o.date
        )),
        None => {
            let ids: Vec<&str> = ORDERS.iter().map(|o| o.id).collect();
            ToolResult::miss(format!(
                "未找到订单 {order_id}。可查询的订单: {}",
                ids.join(", ")
            ))
        }
    }
}

fn summary() -> String {
    let total_sales: u64 = SALES.iter().map(|s| s.total).sum();
    let total_orders: u64 = SALES.iter().map(|s| s.orders).sum();
    // First maximum wins on ties.
    let best = SALES
        .iter()
        .fold(&SALES[0], |best, s| if s.total > best.total { s } else { best });
    let average = (total_sales as f64 / SALES.len() as f64).round() as u64;

    format!(
        "📈 2024年度销售汇总:\n  年度总销售额: ¥{}\n  年度总订单数: {}\n  最佳月份: {} (¥{})\n  月均销售额: ¥{}",
        thousands(total_sales),
        total_orders,
        best.month,
        thousands(best.total),
        thousands(average)
    )
}

/// Format with comma thousands separators.
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
