// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android engine endpoint via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. The native engine is the Java
// `io.agora.iris.rtc.IrisRtcEngine` object; every trait method is a JNI call
// into it.
//
// ## Event shim
//
// The engine delivers events to an `io.agora.iris.base.IrisEventHandler`.
// The host app ships a small Java class `io.agora.rtcbridge.NativeEventHandler`
// implementing that interface whose two `OnEvent` overloads forward to
//
//     private static native void nativeOnEvent(String event, String data, byte[] buffer);
//
// which lands in `Java_io_agora_rtcbridge_NativeEventHandler_nativeOnEvent`
// below and is routed to the handler installed through `set_event_handler`.

#![cfg(target_os = "android")]

use std::sync::{Arc, PoisonError, RwLock};

use jni::objects::{GlobalRef, JByteArray, JObject, JString, JThrowable, JValue};
use jni::{JNIEnv, JavaVM};

use rtcbridge_core::error::{BridgeError, Result};
use rtcbridge_core::types::{ApiType, EngineHandle};

use crate::traits::*;

// ---------------------------------------------------------------------------
// JNI class names and signatures
// ---------------------------------------------------------------------------

const ENGINE_CLASS: &str = "io/agora/iris/rtc/IrisRtcEngine";
const EVENT_SHIM_CLASS: &str = "io/agora/rtcbridge/NativeEventHandler";

const SIG_CALL_API: &str = "(ILjava/lang/String;Ljava/lang/StringBuffer;)I";
const SIG_CALL_API_WITH_BUFFER: &str = "(ILjava/lang/String;[BLjava/lang/StringBuffer;)I";
const SIG_SET_EVENT_HANDLER: &str = "(Lio/agora/iris/base/IrisEventHandler;)V";

/// Handler receiving events from the Java shim. There is one engine per
/// process on Android, so a single slot suffices.
static EVENT_HANDLER: RwLock<Option<Arc<dyn NativeEventHandler>>> = RwLock::new(None);

/// Convenience: map any `jni::errors::Error` into `BridgeError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> BridgeError {
    BridgeError::Bridge(format!("{context}: {e}"))
}

/// Map a failed engine method call. A thrown Java exception is cleared so the
/// attached thread stays usable, and its message becomes the error text.
fn call_err(env: &mut JNIEnv<'_>, context: &str, e: jni::errors::Error) -> BridgeError {
    if !matches!(e, jni::errors::Error::JavaException) {
        return jni_err(context, e);
    }
    let thrown = match env.exception_occurred() {
        Ok(thrown) => thrown,
        Err(e) => return jni_err(context, e),
    };
    if let Err(e) = env.exception_clear() {
        return jni_err(context, e);
    }
    match exception_message(env, &thrown) {
        Ok(message) => {
            tracing::warn!(context, %message, "Android: engine threw");
            BridgeError::Marshal(message)
        }
        Err(e) => jni_err(context, e),
    }
}

/// `Throwable.getMessage()`, empty when null.
fn exception_message(
    env: &mut JNIEnv<'_>,
    thrown: &JThrowable<'_>,
) -> std::result::Result<String, jni::errors::Error> {
    let message = env
        .call_method(thrown, "getMessage", "()Ljava/lang/String;", &[])?
        .l()?;
    if message.is_null() {
        return Ok(String::new());
    }
    Ok(env.get_string(&JString::from(message))?.into())
}

/// A Java string for `Some`, a null reference for `None`.
fn string_or_null<'local>(env: &mut JNIEnv<'local>, value: Option<&str>) -> Result<JObject<'local>> {
    match value {
        Some(s) => Ok(env
            .new_string(s)
            .map_err(|e| jni_err("new_string(params)", e))?
            .into()),
        None => Ok(JObject::null()),
    }
}

/// Drain a `java.lang.StringBuffer` into `out`.
fn read_string_buffer(env: &mut JNIEnv<'_>, sb: &JObject<'_>, out: &mut String) -> Result<()> {
    let obj = env
        .call_method(sb, "toString", "()Ljava/lang/String;", &[])
        .map_err(|e| jni_err("StringBuffer.toString", e))?
        .l()
        .map_err(|e| jni_err("toString->l", e))?;
    let jstr = JString::from(obj);
    let text: String = env
        .get_string(&jstr)
        .map_err(|e| jni_err("get_string(result)", e))?
        .into();
    out.push_str(&text);
    Ok(())
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Android implementation of the native engine endpoint.
pub struct AndroidEndpoint {
    vm: JavaVM,
    engine: GlobalRef,
}

impl AndroidEndpoint {
    /// Construct the Java engine object against the hosting application
    /// context obtained from `ndk_context`.
    pub fn new() -> Result<Self> {
        let ctx = ndk_context::android_context();
        // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
        // The pointer is valid for the lifetime of the process.
        let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
            .map_err(|e| jni_err("failed to obtain JavaVM", e))?;

        let context_ptr = ctx.context();
        if context_ptr.is_null() {
            return Err(BridgeError::Bridge(
                "Android context is null; host activity not initialised".into(),
            ));
        }

        let engine = {
            let mut env = vm
                .attach_current_thread()
                .map_err(|e| jni_err("failed to attach JNI thread", e))?;
            // SAFETY: the NDK guarantees this pointer is a valid global
            // jobject for the hosting application context.
            let context = unsafe { JObject::from_raw(context_ptr.cast()) };
            let local = env
                .new_object(
                    ENGINE_CLASS,
                    "(Landroid/content/Context;)V",
                    &[JValue::Object(&context)],
                )
                .map_err(|e| jni_err("new IrisRtcEngine", e))?;
            env.new_global_ref(local)
                .map_err(|e| jni_err("new_global_ref(engine)", e))?
        };

        tracing::info!("Android: native engine endpoint constructed");
        Ok(Self { vm, engine })
    }

    fn invoke(
        &self,
        api_type: ApiType,
        params: Option<&str>,
        buffer: Option<&[u8]>,
        result: &mut String,
    ) -> Result<i32> {
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| jni_err("failed to attach JNI thread", e))?;

        let j_params = string_or_null(&mut env, params)?;
        let sb = env
            .new_object("java/lang/StringBuffer", "()V", &[])
            .map_err(|e| jni_err("new StringBuffer", e))?;

        let outcome = match buffer {
            None => env.call_method(
                self.engine.as_obj(),
                "callApi",
                SIG_CALL_API,
                &[
                    JValue::Int(api_type.0),
                    JValue::Object(&j_params),
                    JValue::Object(&sb),
                ],
            ),
            Some(bytes) => {
                let j_buffer = env
                    .byte_array_from_slice(bytes)
                    .map_err(|e| jni_err("byte_array_from_slice", e))?;
                env.call_method(
                    self.engine.as_obj(),
                    "callApi",
                    SIG_CALL_API_WITH_BUFFER,
                    &[
                        JValue::Int(api_type.0),
                        JValue::Object(&j_params),
                        JValue::Object(&j_buffer),
                        JValue::Object(&sb),
                    ],
                )
            }
        };
        let ret = match outcome {
            Ok(value) => value.i().map_err(|e| jni_err("callApi->i", e))?,
            Err(e) => return Err(call_err(&mut env, "IrisRtcEngine.callApi", e)),
        };

        read_string_buffer(&mut env, &sb, result)?;
        Ok(ret)
    }
}

impl NativeEndpoint for AndroidEndpoint {
    fn platform_name(&self) -> &str {
        "Android"
    }

    fn call_api(
        &self,
        api_type: ApiType,
        params: Option<&str>,
        result: &mut String,
    ) -> Result<i32> {
        self.invoke(api_type, params, None, result)
    }

    fn call_api_with_buffer(
        &self,
        api_type: ApiType,
        params: Option<&str>,
        buffer: &[u8],
        result: &mut String,
    ) -> Result<i32> {
        self.invoke(api_type, params, Some(buffer), result)
    }

    fn set_event_handler(&self, handler: Option<Arc<dyn NativeEventHandler>>) -> Result<()> {
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| jni_err("failed to attach JNI thread", e))?;

        let installing = handler.is_some();
        let previous = std::mem::replace(
            &mut *EVENT_HANDLER.write().unwrap_or_else(PoisonError::into_inner),
            handler,
        );
        let restore = |previous| {
            *EVENT_HANDLER.write().unwrap_or_else(PoisonError::into_inner) = previous;
        };

        let shim = if installing {
            match env.new_object(EVENT_SHIM_CLASS, "()V", &[]) {
                Ok(shim) => shim,
                Err(e) => {
                    restore(previous);
                    return Err(jni_err("new NativeEventHandler", e));
                }
            }
        } else {
            JObject::null()
        };
        if let Err(e) = env.call_method(
            self.engine.as_obj(),
            "setEventHandler",
            SIG_SET_EVENT_HANDLER,
            &[JValue::Object(&shim)],
        ) {
            restore(previous);
            return Err(call_err(&mut env, "IrisRtcEngine.setEventHandler", e));
        }

        tracing::debug!(installing, "Android: event handler updated");
        Ok(())
    }

    fn engine_handle(&self) -> Option<EngineHandle> {
        let mut env = match self.vm.attach_current_thread() {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "Android: attach failed during engine lookup");
                return None;
            }
        };
        let engine = env
            .call_method(self.engine.as_obj(), "getRtcEngine", "()Ljava/lang/Object;", &[])
            .and_then(|v| v.l());
        match engine {
            Ok(obj) if !obj.is_null() => self.native_handle().ok().map(EngineHandle::new),
            Ok(_) => None,
            Err(e) => {
                let e = call_err(&mut env, "IrisRtcEngine.getRtcEngine", e);
                tracing::warn!(error = %e, "Android: getRtcEngine failed");
                None
            }
        }
    }

    fn native_handle(&self) -> Result<i64> {
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| jni_err("failed to attach JNI thread", e))?;
        match env.call_method(self.engine.as_obj(), "getNativeHandle", "()J", &[]) {
            Ok(value) => value.j().map_err(|e| jni_err("getNativeHandle->j", e)),
            Err(e) => Err(call_err(&mut env, "IrisRtcEngine.getNativeHandle", e)),
        }
    }

    fn destroy(&self) -> Result<()> {
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| jni_err("failed to attach JNI thread", e))?;
        if let Err(e) = env.call_method(self.engine.as_obj(), "destroy", "()V", &[]) {
            return Err(call_err(&mut env, "IrisRtcEngine.destroy", e));
        }
        *EVENT_HANDLER.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("Android: native engine destroyed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JNI entry point for the event shim
// ---------------------------------------------------------------------------

fn optional_string(env: &mut JNIEnv<'_>, value: &JString<'_>) -> Option<String> {
    if value.is_null() {
        return None;
    }
    env.get_string(value).ok().map(Into::into)
}

/// Called by `io.agora.rtcbridge.NativeEventHandler.nativeOnEvent` on the
/// engine's callback thread.
#[unsafe(no_mangle)]
pub extern "system" fn Java_io_agora_rtcbridge_NativeEventHandler_nativeOnEvent<'local>(
    mut env: JNIEnv<'local>,
    _class: JObject<'local>,
    event: JString<'local>,
    data: JString<'local>,
    buffer: JByteArray<'local>,
) {
    let handler = EVENT_HANDLER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let Some(handler) = handler else {
        return;
    };

    let Some(event) = optional_string(&mut env, &event) else {
        tracing::warn!("Android: dropping native event without a name");
        return;
    };
    let data = optional_string(&mut env, &data);
    let buffer = if buffer.is_null() {
        None
    } else {
        match env.convert_byte_array(&buffer) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(error = %e, %event, "Android: failed to read event buffer");
                None
            }
        }
    };

    handler.on_event(&event, data.as_deref(), buffer.as_deref());
}
