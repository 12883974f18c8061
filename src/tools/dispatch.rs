//! Dispatch Contract - the lifecycle shared by every tool call
//!
//! Information Hiding:
//! - Span creation and error recording hidden from tool implementations
//! - Input decoding and its failure shape handled once for all tools
//! - Mapping of handler failures onto envelope vs transport error internalized

use super::{
    CallContext, CallToolParams, CallToolResult, DomainError, HandlerError, ToolError, ToolHandler,
};
use tracing::{field, Instrument, Span};

/// Run one tool call through the full contract: open the handler span, log the
/// input, decode it, execute, and map the outcome onto the envelope.
///
/// Domain failures come back as `Ok` with `is_error` set. Only decode failures
/// and transport errors raised by the handler use `Err`.
pub async fn invoke<H>(
    handler: &H,
    ctx: &CallContext,
    params: CallToolParams,
) -> Result<CallToolResult, ToolError>
where
    H: ToolHandler,
{
    let span = tracing::info_span!(
        "tool.handler",
        otel.name = %format!("{}.Handler", handler.name()),
        tool_name = %handler.name(),
        tool_argument = %params.arguments,
        error = field::Empty,
    );

    run(handler, ctx, &params, &span)
        .instrument(span.clone())
        .await
}

async fn run<H>(
    handler: &H,
    ctx: &CallContext,
    params: &CallToolParams,
    span: &Span,
) -> Result<CallToolResult, ToolError>
where
    H: ToolHandler,
{
    let tool = handler.name();

    tracing::info!(tool_name = tool, arguments = %params.arguments, "Received input");

    let input: H::Input = match serde_json::from_str(&params.arguments) {
        Ok(input) => input,
        Err(source) => {
            let err = ToolError::InvalidInput {
                tool: tool.to_string(),
                source,
            };
            return Err(transport_failure(span, tool, params, err));
        }
    };

    let outcome = tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => {
            Err(HandlerError::Domain(DomainError::new(tool, "call cancelled")))
        }
        outcome = handler.handle(ctx, input) => outcome,
    };

    match outcome {
        Ok(content) => {
            let result = CallToolResult::success(content);
            tracing::info!(
                tool_name = tool,
                result_length = result.content_length(),
                "Tool call completed successfully"
            );
            Ok(result)
        }
        Err(HandlerError::Domain(err)) => {
            span.record("error", field::display(&err));
            tracing::error!(
                tool_name = tool,
                operation = %err.operation,
                error = %err,
                "Tool operation failed"
            );
            Ok(CallToolResult::error(err.message))
        }
        Err(HandlerError::Transport(err)) => Err(transport_failure(span, tool, params, err)),
    }
}

fn transport_failure(
    span: &Span,
    tool: &str,
    params: &CallToolParams,
    err: ToolError,
) -> ToolError {
    span.record("error", field::display(&err));
    tracing::error!(
        tool_name = tool,
        raw_input = %params.arguments,
        error = %err,
        "Tool call rejected"
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ContentType, Tool, ToolContent};
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::fmt::{self, Write as _};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing::field::{Field, Visit};
    use tracing::{span, Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[derive(Deserialize)]
    struct ScriptedInput {
        mode: String,
    }

    #[derive(Default)]
    struct ScriptedTool {
        handled: AtomicUsize,
    }

    #[async_trait]
    impl ToolHandler for ScriptedTool {
        type Input = ScriptedInput;

        fn name(&self) -> &str {
            "scripted"
        }

        fn description(&self) -> &str {
            "Exercises every dispatch outcome"
        }

        fn input_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"mode": {"type": "string"}},
                "required": ["mode"]
            })
        }

        async fn handle(
            &self,
            _ctx: &CallContext,
            input: ScriptedInput,
        ) -> Result<ToolContent, HandlerError> {
            self.handled.fetch_add(1, Ordering::SeqCst);
            match input.mode.as_str() {
                "ok" => Ok(ToolContent::text("fine")),
                "domain" => Err(DomainError::new("scripted_op", "remote said no").into()),
                "transport" => Err(ToolError::UnknownTool("ghost".to_string()).into()),
                _ => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(ToolContent::text("too late"))
                }
            }
        }
    }

    async fn call(tool: &ScriptedTool, args: &str) -> Result<CallToolResult, ToolError> {
        tool.call(&CallContext::new(), CallToolParams::new("scripted", args))
            .await
    }

    #[tokio::test]
    async fn test_success_populates_envelope() {
        let tool = ScriptedTool::default();
        let result = call(&tool, r#"{"mode":"ok"}"#).await.unwrap();

        assert!(!result.is_error);
        assert_eq!(result.content, vec![ToolContent::text("fine")]);
    }

    #[tokio::test]
    async fn test_domain_failure_is_data() {
        let tool = ScriptedTool::default();
        let result = call(&tool, r#"{"mode":"domain"}"#).await.unwrap();

        assert!(result.is_error);
        assert_eq!(result.content[0].content_type, ContentType::Text);
        assert_eq!(result.text(), "remote said no");
    }

    #[tokio::test]
    async fn test_malformed_json_is_transport_error() {
        let tool = ScriptedTool::default();
        let err = call(&tool, "{not json").await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidInput { ref tool, .. } if tool == "scripted"));
        assert_eq!(tool.handled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_transport_error() {
        let tool = ScriptedTool::default();
        let err = call(&tool, "{}").await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidInput { .. }));
        assert!(err.to_string().contains("mode"));
    }

    #[tokio::test]
    async fn test_mistyped_field_is_transport_error() {
        let tool = ScriptedTool::default();
        let err = call(&tool, r#"{"mode": 7}"#).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_handler_transport_error_passes_through() {
        let tool = ScriptedTool::default();
        let err = call(&tool, r#"{"mode":"transport"}"#).await.unwrap_err();

        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn test_cancelled_call_reports_domain_failure() {
        let tool = ScriptedTool::default();
        let ctx = CallContext::new();
        ctx.cancellation().cancel();

        let result = tool
            .call(&ctx, CallToolParams::new("scripted", r#"{"mode":"slow"}"#))
            .await
            .unwrap();

        assert!(result.is_error);
        assert_eq!(result.text(), "call cancelled");
    }

    /// Flattens spans, span records and events into one line each.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<String>>>);

    impl Captured {
        fn lines(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        fn any(&self, prefix: &str, needles: &[&str]) -> bool {
            self.lines()
                .iter()
                .any(|line| line.starts_with(prefix) && needles.iter().all(|n| line.contains(n)))
        }
    }

    struct FieldText(String);

    impl Visit for FieldText {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            let _ = write!(self.0, " {}={:?}", field.name(), value);
        }
    }

    impl<S: Subscriber> Layer<S> for Captured {
        fn on_new_span(&self, attrs: &span::Attributes<'_>, _id: &span::Id, _ctx: Context<'_, S>) {
            let mut text = FieldText(format!("span {}", attrs.metadata().name()));
            attrs.record(&mut text);
            self.0.lock().unwrap().push(text.0);
        }

        fn on_record(&self, _id: &span::Id, values: &span::Record<'_>, _ctx: Context<'_, S>) {
            let mut text = FieldText("record".to_string());
            values.record(&mut text);
            self.0.lock().unwrap().push(text.0);
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut text = FieldText(format!("event {}", event.metadata().level()));
            event.record(&mut text);
            self.0.lock().unwrap().push(text.0);
        }
    }

    async fn traced_call(args: &str) -> (Captured, Result<CallToolResult, ToolError>) {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = call(&ScriptedTool::default(), args).await;
        (captured, result)
    }

    #[tokio::test]
    async fn test_success_emits_span_input_and_completion() {
        let (captured, result) = traced_call(r#"{"mode":"ok"}"#).await;

        assert!(!result.unwrap().is_error);
        assert!(captured.any(
            "span tool.handler",
            &["otel.name=scripted.Handler", "tool_name=scripted", r#"tool_argument={"mode":"ok"}"#]
        ));
        assert!(captured.any("event INFO", &["message=Received input"]));
        assert!(captured.any(
            "event INFO",
            &["message=Tool call completed successfully", "result_length=1"]
        ));
        assert!(!captured.any("record", &["error="]));
    }

    #[tokio::test]
    async fn test_domain_failure_records_error_on_span() {
        let (captured, result) = traced_call(r#"{"mode":"domain"}"#).await;

        assert!(result.unwrap().is_error);
        assert!(captured.any("event INFO", &["message=Received input"]));
        assert!(captured.any("record", &["error=remote said no"]));
        assert!(captured.any(
            "event ERROR",
            &["message=Tool operation failed", "operation=scripted_op"]
        ));
        assert!(!captured.any("event INFO", &["message=Tool call completed successfully"]));
    }

    #[tokio::test]
    async fn test_decode_failure_records_error_on_span() {
        let (captured, result) = traced_call("{not json").await;

        assert!(result.is_err());
        assert!(captured.any("event INFO", &["message=Received input"]));
        assert!(captured.any(
            "record",
            &["error=failed to parse input for tool 'scripted'"]
        ));
        assert!(captured.any(
            "event ERROR",
            &["message=Tool call rejected", "raw_input={not json"]
        ));
    }

    #[test]
    fn test_descriptor_comes_from_handler() {
        let descriptor = ScriptedTool::default().descriptor();

        assert_eq!(descriptor.name, "scripted");
        assert_eq!(descriptor.input_schema["required"], json!(["mode"]));
    }
}
