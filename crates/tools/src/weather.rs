//! Weather query tool over a fixed table of Chinese cities.

use async_trait::async_trait;
use smartflow_core::error::ToolError;
use smartflow_core::tool::{Tool, ToolResult, required_str};

pub struct WeatherQueryTool;

struct CityWeather {
    city: &'static str,
    temperature: i32,
    condition: &'static str,
    humidity: u32,
    wind: &'static str,
    suggestion: &'static str,
}

const WEATHER_TABLE: &[CityWeather] = &[
    CityWeather { city: "北京", temperature: 5, condition: "晴", humidity: 30, wind: "北风3级",
        suggestion: "天气寒冷干燥，建议穿羽绒服、围巾和手套，注意保暖防风。" },
    CityWeather { city: "上海", temperature: 12, condition: "多云", humidity: 65, wind: "东南风2级",
        suggestion: "气温适中偏凉，建议穿薄外套或风衣，可搭配毛衣。" },
    CityWeather { city: "广州", temperature: 22, condition: "阴", humidity: 80, wind: "南风2级",
        suggestion: "温暖湿润，穿长袖衬衫或薄外套即可，建议随身带伞。" },
    CityWeather { city: "深圳", temperature: 23, condition: "多云转晴", humidity: 75, wind: "东南风3级",
        suggestion: "天气温暖，穿T恤或薄长袖即可，户外注意防晒。" },
    CityWeather { city: "成都", temperature: 14, condition: "阴天", humidity: 70, wind: "微风",
        suggestion: "阴冷潮湿，建议穿厚外套或夹克，注意保暖。" },
    CityWeather { city: "杭州", temperature: 10, condition: "小雨", humidity: 85, wind: "东风2级",
        suggestion: "有小雨，建议穿防水外套，随身带雨伞。穿毛衣搭配风衣为佳。" },
    CityWeather { city: "武汉", temperature: 8, condition: "晴转多云", humidity: 50, wind: "北风2级",
        suggestion: "早晚温差大，建议穿大衣或厚外套，中午可适当减衣。" },
    CityWeather { city: "西安", temperature: 3, condition: "晴", humidity: 25, wind: "西北风3级",
        suggestion: "天气寒冷，建议穿棉衣或羽绒服，戴帽子和手套。" },
];

#[async_trait]
impl Tool for WeatherQueryTool {
    fn name(&self) -> &str {
        "weather_query"
    }

    fn description(&self) -> &str {
        "Query the weather information for a Chinese city."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The name of the city in Chinese, e.g. \"北京\""
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let city = required_str(&arguments, "city")?;
        Ok(match lookup(city) {
            Some(w) => ToolResult::ok(format!(
                "🌤 {}天气信息:\n  温度: {}°C\n  天气: {}\n  湿度: {}%\n  风力: {}\n  穿衣建议: {}",
                w.city, w.temperature, w.condition, w.humidity, w.wind, w.suggestion
            )),
            None => ToolResult::miss(format!(
                "抱歉，暂无 {city} 的天气数据。目前支持查询的城市有：{}",
                supported_cities().join(", ")
            )),
        })
    }
}

/// A known city matches when its name appears anywhere in the input.
fn lookup(input: &str) -> Option<&'static CityWeather> {
    WEATHER_TABLE.iter().find(|w| input.contains(w.city))
}

pub fn supported_cities() -> Vec<&'static str> {
    WEATHER_TABLE.iter().map(|w| w.city).collect()
}
