//! dispatch/handlers.rs — Gestionnaires de commandes concrets (§4.11)
//!
//! Un adaptateur fin par commande, qui ne fait qu'appeler le sous-système
//! pertinent de `CoreDebugger` et reformer le résultat en JSON.

use super::CommandHandler;
use crate::debugger::CoreDebugger;
use crate::error::{DebugResult, DebuggerError};
use crate::step::StepGranularity;
use serde_json::Value;

fn thread_id_arg(args: &Value) -> DebugResult<i64> {
    args.get("threadId")
        .and_then(Value::as_i64)
        .ok_or_else(|| DebuggerError::Protocol { message: "missing threadId".into() })
}

/// `continue` — reprend l'exécution d'un thread arrêté.
pub struct ContinueHandler;

impl CommandHandler for ContinueHandler {
    fn handle(&self, debugger: &CoreDebugger, args: &Value) -> DebugResult<Option<Value>> {
        let tid = thread_id_arg(args)?;
        debugger.resume(tid);
        Ok(Some(serde_json::json!({ "allThreadsContinued": false })))
    }
}

/// `next` / `stepIn` partagent la même forme : ils diffèrent par la
/// granularité et le mode de step demandés au `StepController`.
pub struct StepHandler {
    pub granularity_default: StepGranularity,
}

impl CommandHandler for StepHandler {
    fn handle(&self, debugger: &CoreDebugger, args: &Value) -> DebugResult<Option<Value>> {
        let tid = thread_id_arg(args)?;
        let granularity = args
            .get("granularity")
            .and_then(Value::as_str)
            .map(StepGranularity::from_dap_str)
            .unwrap_or(self.granularity_default);
        debugger.request_step(tid, granularity);
        debugger.resume(tid);
        Ok(None)
    }
}

/// `stackTrace` — renvoie la pile courante d'un thread arrêté.
pub struct StackTraceHandler;

impl CommandHandler for StackTraceHandler {
    fn handle(&self, debugger: &CoreDebugger, args: &Value) -> DebugResult<Option<Value>> {
        let tid = thread_id_arg(args)?;
        let frames = debugger.stack_trace(tid);
        let frames_json: Vec<Value> = frames
            .iter()
            .map(|f| {
                serde_json::json!({
                    "id": f.id,
                    "name": f.name,
                    "line": f.line,
                    "column": f.column,
                    "source": { "name": f.source_name, "path": f.source_path },
                })
            })
            .collect();
        Ok(Some(serde_json::json!({ "stackFrames": frames_json, "totalFrames": frames_json.len() })))
    }
}

/// `disconnect` — termine la session et invoque le hook de déconnexion.
pub struct DisconnectHandler;

impl CommandHandler for DisconnectHandler {
    fn handle(&self, debugger: &CoreDebugger, _args: &Value) -> DebugResult<Option<Value>> {
        debugger.disconnect();
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TracingBackendKind;
    use crate::debugger::{CoreDebugger, SessionHooks};
    use crate::resolver::BreakpointMeta;

    fn debugger() -> CoreDebugger {
        CoreDebugger::new(Some(TracingBackendKind::Settrace), SessionHooks::default())
    }

    #[test]
    fn continue_resumes_stopped_thread() {
        let dbg = debugger();
        dbg.register_breakpoint_meta(1, BreakpointMeta::default());
        dbg.user_line(3, Some(1));
        let resp = ContinueHandler.handle(&dbg, &serde_json::json!({"threadId": 3}));
        assert!(resp.is_ok());
    }

    #[test]
    fn missing_thread_id_is_protocol_error() {
        let dbg = debugger();
        let resp = ContinueHandler.handle(&dbg, &serde_json::json!({}));
        assert!(matches!(resp, Err(DebuggerError::Protocol { .. })));
    }

    #[test]
    fn stack_trace_handler_returns_empty_for_unknown_thread() {
        let dbg = debugger();
        let resp = StackTraceHandler.handle(&dbg, &serde_json::json!({"threadId": 99})).unwrap().unwrap();
        assert_eq!(resp["totalFrames"], 0);
    }

    #[test]
    fn step_handler_parses_granularity() {
        let dbg = debugger();
        let handler = StepHandler { granularity_default: StepGranularity::Line };
        let resp = handler.handle(&dbg, &serde_json::json!({"threadId": 1, "granularity": "instruction"}));
        assert!(resp.is_ok());
    }
}
