//! Embedded script engine.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use rquickjs::{
    CatchResultExt, Context, Ctx, Function, Object, Runtime, Value, context::EvalOptions,
    convert::Coerced, function::Rest,
};

use crate::{ExecuteError, ExecutorConfig};

const SCRIPT_LOG_TARGET: &str = "push_dispatch::script";

/// QuickJS runtime with a single persistent context.
///
/// Globals defined by one execution stay visible to the next. Code runs in
/// sloppy mode at global scope, so bare assignments define globals.
pub struct ScriptEngine {
    runtime: Runtime,
    context: Context,
    timeout: Option<Duration>,
}

impl ScriptEngine {
    /// Create an engine with the limits from `config`.
    ///
    /// # Errors
    /// Returns error if the runtime or context cannot be created.
    pub fn new(config: &ExecutorConfig) -> Result<Self, ExecuteError> {
        let runtime = Runtime::new()?;
        if let Some(limit) = config.memory_limit_bytes {
            runtime.set_memory_limit(limit);
        }
        if let Some(limit) = config.max_stack_bytes {
            runtime.set_max_stack_size(limit);
        }

        let context = Context::full(&runtime)?;
        context.with(|ctx| install_console(&ctx))?;

        Ok(Self {
            runtime,
            context,
            timeout: config.timeout(),
        })
    }

    /// Execute `code` to completion, including any promise jobs it queues.
    ///
    /// # Errors
    /// Returns `ExecuteError::Script` if the code fails to parse or throws,
    /// and `ExecuteError::TimedOut` if it outlives the configured timeout.
    pub fn execute(&self, code: &str) -> Result<(), ExecuteError> {
        let interrupted = Arc::new(AtomicBool::new(false));
        if let Some(timeout) = self.timeout {
            let deadline = Instant::now() + timeout;
            let flag = Arc::clone(&interrupted);
            self.runtime.set_interrupt_handler(Some(Box::new(move || {
                let expired = Instant::now() >= deadline;
                if expired {
                    flag.store(true, Ordering::Relaxed);
                }
                expired
            })));
        }

        let result = self.context.with(|ctx| {
            let mut options = EvalOptions::default();
            options.strict = false;
            ctx.eval_with_options::<Value, _>(code, options)
                .map(drop)
                .catch(&ctx)
                .map_err(|err| err.to_string())
        });
        // Jobs queued before a throw still belong to this payload.
        let drained = self.drain_jobs(&interrupted);

        if self.timeout.is_some() {
            self.runtime.set_interrupt_handler(None);
        }

        if interrupted.load(Ordering::Relaxed) {
            return Err(self.timed_out());
        }
        result.map_err(|message| ExecuteError::Script { message })?;
        drained
    }

    fn drain_jobs(&self, interrupted: &AtomicBool) -> Result<(), ExecuteError> {
        let mut timed_out = false;
        while self.runtime.is_job_pending() {
            if self.runtime.execute_pending_job().is_err() {
                if interrupted.load(Ordering::Relaxed) {
                    timed_out = true;
                } else {
                    tracing::warn!(target: SCRIPT_LOG_TARGET, "Pending script job raised an exception");
                }
            }
        }
        if timed_out {
            Err(self.timed_out())
        } else {
            Ok(())
        }
    }

    fn timed_out(&self) -> ExecuteError {
        ExecuteError::TimedOut(self.timeout.unwrap_or_default())
    }

    /// Read a global as JSON.
    ///
    /// Returns `None` for undefined globals and values with no JSON form.
    ///
    /// # Errors
    /// Returns error if the value cannot be serialized.
    pub fn global(&self, name: &str) -> Result<Option<serde_json::Value>, ExecuteError> {
        let json = self.context.with(|ctx| -> rquickjs::Result<Option<String>> {
            let value: Value = ctx.globals().get(name)?;
            ctx.json_stringify(value)?
                .map(|s| s.to_string())
                .transpose()
        })?;
        json.map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(Into::into)
    }

    /// Publish a JSON value as a global.
    ///
    /// # Errors
    /// Returns error if the value cannot be converted.
    pub fn set_global(&self, name: &str, value: &serde_json::Value) -> Result<(), ExecuteError> {
        let json = serde_json::to_string(value)?;
        self.context.with(|ctx| {
            let value = ctx.json_parse(json)?;
            ctx.globals().set(name, value)
        })?;
        Ok(())
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn install_console(ctx: &Ctx<'_>) -> rquickjs::Result<()> {
    let console = Object::new(ctx.clone())?;
    console.set(
        "log",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::info!(target: SCRIPT_LOG_TARGET, "{}", join_args(&args));
        })?,
    )?;
    console.set(
        "info",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::info!(target: SCRIPT_LOG_TARGET, "{}", join_args(&args));
        })?,
    )?;
    console.set(
        "warn",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::warn!(target: SCRIPT_LOG_TARGET, "{}", join_args(&args));
        })?,
    )?;
    console.set(
        "error",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::error!(target: SCRIPT_LOG_TARGET, "{}", join_args(&args));
        })?,
    )?;
    ctx.globals().set("console", console)
}

fn join_args(args: &Rest<Coerced<String>>) -> String {
    args.0
        .iter()
        .map(|arg| arg.0.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn engine() -> ScriptEngine {
        ScriptEngine::new(&ExecutorConfig::default()).unwrap()
    }

    #[test]
    fn test_assignment_defines_global() {
        let engine = engine();
        engine.execute("x=1+1").unwrap();
        assert_eq!(engine.global("x").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_state_persists_between_executions() {
        let engine = engine();
        engine.execute("var items = [];").unwrap();
        engine.execute("items.push('a'); items.push('b');").unwrap();
        assert_eq!(engine.global("items").unwrap(), Some(json!(["a", "b"])));
    }

    #[test]
    fn test_undefined_global_is_none() {
        assert_eq!(engine().global("missing").unwrap(), None);
    }

    #[test]
    fn test_syntax_error_is_script_error() {
        let err = engine().execute("x = ;").unwrap_err();
        assert!(matches!(err, ExecuteError::Script { .. }));
    }

    #[test]
    fn test_thrown_error_keeps_message() {
        let err = engine().execute("throw new Error('boom')").unwrap_err();
        match err {
            ExecuteError::Script { message } => assert!(message.contains("boom")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_set_global_is_visible_to_scripts() {
        let engine = engine();
        engine
            .set_global("client", &json!({ "user": "ada", "visits": 3 }))
            .unwrap();
        engine.execute("greeting = client.user + ':' + (client.visits + 1)").unwrap();
        assert_eq!(engine.global("greeting").unwrap(), Some(json!("ada:4")));
    }

    #[test]
    fn test_console_is_available() {
        let engine = engine();
        engine
            .execute("console.log('hello', 1, {a: 1}); console.warn('careful'); done = true")
            .unwrap();
        assert_eq!(engine.global("done").unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_promise_jobs_run_before_return() {
        let engine = engine();
        engine
            .execute("resolved = false; Promise.resolve().then(() => { resolved = true; });")
            .unwrap();
        assert_eq!(engine.global("resolved").unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_runaway_script_times_out() {
        let config = ExecutorConfig {
            timeout_ms: Some(50),
            ..ExecutorConfig::default()
        };
        let engine = ScriptEngine::new(&config).unwrap();
        let err = engine.execute("while (true) {}").unwrap_err();
        assert!(matches!(err, ExecuteError::TimedOut(_)));

        // The engine stays usable afterwards.
        engine.execute("after = 1").unwrap();
        assert_eq!(engine.global("after").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_runaway_promise_job_times_out() {
        let config = ExecutorConfig {
            timeout_ms: Some(50),
            ..ExecutorConfig::default()
        };
        let engine = ScriptEngine::new(&config).unwrap();
        let err = engine
            .execute("Promise.resolve().then(() => { while (true) {} })")
            .unwrap_err();
        assert!(matches!(err, ExecuteError::TimedOut(_)));

        engine.execute("after = 2").unwrap();
        assert_eq!(engine.global("after").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_jobs_from_failing_payload_run_before_return() {
        let engine = engine();
        let err = engine
            .execute("Promise.resolve().then(() => { later = true; }); throw new Error('x')")
            .unwrap_err();
        assert!(matches!(err, ExecuteError::Script { .. }));
        assert_eq!(engine.global("later").unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_error_after_deadline_is_script_error() {
        let config = ExecutorConfig {
            timeout_ms: Some(20),
            ..ExecutorConfig::default()
        };
        let engine = ScriptEngine::new(&config).unwrap();
        engine
            .context
            .with(|ctx| {
                let sleep = Function::new(ctx.clone(), |ms: f64| {
                    std::thread::sleep(Duration::from_secs_f64(ms / 1000.0));
                })?;
                ctx.globals().set("sleep", sleep)
            })
            .unwrap();

        let err = engine
            .execute("sleep(60); throw new Error('late')")
            .unwrap_err();
        match err {
            ExecuteError::Script { message } => assert!(message.contains("late")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_host_io_in_context() {
        let engine = engine();
        engine
            .execute("kinds = [typeof require, typeof process, typeof std, typeof os]")
            .unwrap();
        assert_eq!(
            engine.global("kinds").unwrap(),
            Some(json!(["undefined", "undefined", "undefined", "undefined"]))
        );
    }
}
