//! Chart generation and rendering for the dashboard.
//!
//! The spending chart is generated as JSON configuration for the ECharts
//! library and rendered with an HTML container and JavaScript
//! initialization code.

use charming::{
    Chart,
    component::Title,
    element::{Tooltip, Trigger},
    series::Pie,
};
use maud::{Markup, PreEscaped, html};

use crate::{Error, html::HeadElement};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML container for a dashboard chart.
pub(super) fn chart_view(chart: &DashboardChart) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div
                id=(chart.id)
                class="min-h-[380px] rounded dark:bg-gray-100"
            {}
        }
    )
}

/// Generates JavaScript initialization code for a dashboard chart.
///
/// Creates a script that initializes an ECharts instance with dark mode
/// support and responsive resizing.
pub(super) fn chart_script(chart: &DashboardChart) -> HeadElement {
    let script_content = format!(
        r#"(function() {{
            const chartDom = document.getElementById("{}");
            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);
        }})();"#,
        chart.id, chart.options
    );

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// The pie chart of this month's expenses grouped by category.
pub(super) fn spending_chart(
    category_totals: &[(String, f64)],
) -> Result<DashboardChart, Error> {
    let data: Vec<(f64, &str)> = category_totals
        .iter()
        .map(|(name, total)| (*total, name.as_str()))
        .collect();

    let chart = Chart::new()
        .title(
            Title::new()
                .text("Spending by category")
                .subtext("This month"),
        )
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .series(Pie::new().name("Spending").radius("55%").data(data));

    let options = serde_json::to_string(&chart)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(DashboardChart {
        id: "spending-chart",
        options,
    })
}
