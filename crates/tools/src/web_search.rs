//! Web search tool backed by a fixed keyword table.
//!
//! The first keyword contained in the query selects its results; anything
//! else gets a generic hint to search with more specific terms.

use async_trait::async_trait;
use smartflow_core::error::ToolError;
use smartflow_core::tool::{Tool, ToolResult, required_str};

pub struct WebSearchTool;

struct SearchHit {
    title: &'static str,
    snippet: &'static str,
    url: &'static str,
}

const SEARCH_TABLE: &[(&str, &[SearchHit])] = &[
    (
        "退货政策",
        &[SearchHit {
            title: "电商退货政策全解析",
            snippet: "根据消费者权益保护法，网购商品可在收到之日起7天内无理由退货。退货商品应保持完好，不影响二次销售。",
            url: "https://example.com/return-policy",
        }],
    ),
    (
        "人工智能",
        &[SearchHit {
            title: "2024年人工智能发展趋势",
            snippet: "大语言模型持续进化，多模态AI成为主流。AI Agent技术快速发展，在企业自动化中扮演重要角色。",
            url: "https://example.com/ai-trends",
        }],
    ),
    (
        "Python编程",
        &[SearchHit {
            title: "Python 3.12 新特性一览",
            snippet: "Python 3.12带来了更好的错误信息、性能提升、以及新的类型标注语法。",
            url: "https://example.com/python312",
        }],
    ),
];

const DEFAULT_HITS: &[SearchHit] = &[SearchHit {
    title: "搜索结果",
    snippet: "暂未找到完全匹配的结果，以下是相关信息的摘要。请尝试使用更具体的关键词搜索。",
    url: "https://example.com/search",
}];

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information on a given query."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query string."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = required_str(&arguments, "query")?;
        Ok(ToolResult::ok(search(query)))
    }
}

fn search(query: &str) -> String {
    let hits = SEARCH_TABLE
        .iter()
        .find(|(keyword, _)| query.contains(keyword))
        .map(|(_, hits)| *hits)
        .unwrap_or(DEFAULT_HITS);

    let mut parts = vec![format!("搜索关键词: {query}\n")];
    for (i, hit) in hits.iter().enumerate() {
        parts.push(format!(
            "{}. **{}**\n   {}\n   来源: {}",
            i + 1,
            hit.title,
            hit.snippet,
            hit.url
        ));
    }
    parts.join("\n")
}
