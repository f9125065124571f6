//! Eval command handler

use super::{open_page, runtime};
use crate::commands::EvalArgs;
use crate::config::{CliConfig, FileConfig};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use lookout::{scoped, wait_for_expression, LookoutError, LookoutResult, PageSession, WaitOptions};
use serde_json::{Map, Value};

/// Evaluations to run once a page is open
#[derive(Debug, Clone)]
pub struct EvalPlan {
    /// Page to open
    pub url: String,
    /// Optional readiness condition
    pub wait_for: Option<String>,
    /// Options for the readiness wait
    pub options: WaitOptions,
    /// `(label, expression)` pairs, evaluated in order
    pub items: Vec<(String, String)>,
}

impl EvalPlan {
    /// Resolve arguments against the configuration file
    pub fn from_args(file: &FileConfig, args: &EvalArgs) -> CliResult<Self> {
        let mut items: Vec<(String, String)> = args
            .expressions
            .iter()
            .map(|expr| (expr.clone(), expr.clone()))
            .collect();
        for name in &args.probes {
            items.push((name.clone(), file.probes.expression(name)?));
        }
        if items.is_empty() {
            return Err(CliError::invalid_argument(
                "give at least one expression or --probe",
            ));
        }
        Ok(Self {
            url: file.url(args.url.as_deref())?,
            wait_for: args.wait_for.clone(),
            options: file.wait,
            items,
        })
    }

    /// Navigate, optionally wait, then evaluate every item.
    ///
    /// A readiness timeout is returned as [`LookoutError::Timeout`].
    pub async fn execute<S>(&self, page: &S) -> LookoutResult<Vec<(String, Value)>>
    where
        S: PageSession + ?Sized,
    {
        page.navigate(&self.url).await?;
        if let Some(ref condition) = self.wait_for {
            wait_for_expression(page, condition, &self.options)
                .await?
                .into_result::<LookoutError>(condition.as_str())?;
        }

        let mut values = Vec::with_capacity(self.items.len());
        for (label, expression) in &self.items {
            values.push((label.clone(), page.evaluate(expression).await?));
        }
        Ok(values)
    }
}

/// Render values: one compact JSON value per line, or one JSON object
pub fn render_values(values: &[(String, Value)], as_object: bool) -> CliResult<String> {
    if as_object {
        let object: Map<String, Value> = values.iter().cloned().collect();
        return serde_json::to_string_pretty(&Value::Object(object))
            .map_err(|e| CliError::output(e.to_string()));
    }
    Ok(values
        .iter()
        .map(|(_, value)| value.to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Execute the eval command; `Ok(false)` means the readiness wait timed out
pub fn execute_eval(config: &CliConfig, file: &FileConfig, args: &EvalArgs) -> CliResult<bool> {
    let plan = EvalPlan::from_args(file, args)?;
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let browser_config = file.browser_config(&args.browser);

    let result = runtime()?.block_on(async move {
        let page = open_page(browser_config).await?;
        let values = scoped(page, move |page| Box::pin(async move { plan.execute(page).await }))
            .await?;
        CliResult::Ok(values)
    });

    match result {
        Ok(values) => {
            println!("{}", render_values(&values, args.json)?);
            Ok(true)
        }
        Err(CliError::Lookout(e)) if e.is_timeout() => {
            reporter.failure(&e.to_string());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
