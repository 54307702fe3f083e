//! Vulkan validation layer support
//!
//! Compiled in only with the `vulkan-validation` feature. The debug
//! messenger forwards validation messages into the renderer's logging
//! system.

#![cfg(feature = "vulkan-validation")]

use ash::vk;
use pulsar_renderer::{engine_error, engine_info, engine_warn};
use std::ffi::CStr;

/// Debug messenger callback: route validation messages to the logger
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }

    let data = &*p_callback_data;
    let message = if data.p_message.is_null() {
        String::from("<no message>")
    } else {
        CStr::from_ptr(data.p_message).to_string_lossy().into_owned()
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            engine_error!("pulsar::vulkan::validation", "{}", message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            engine_warn!("pulsar::vulkan::validation", "{}", message);
        }
        _ => {
            engine_info!("pulsar::vulkan::validation", "{}", message);
        }
    }

    vk::FALSE
}

/// Severity flags the messenger subscribes to
pub fn messenger_severity() -> vk::DebugUtilsMessageSeverityFlagsEXT {
    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
}

/// Message types the messenger subscribes to
pub fn messenger_types() -> vk::DebugUtilsMessageTypeFlagsEXT {
    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
}
