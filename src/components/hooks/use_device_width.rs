use crate::layout::{classify, DeviceWidth};
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;

fn inner_width() -> i32 {
    window()
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .map(|w| w as i32)
        .unwrap_or(0)
}

/// Hook tracking the window width class.
///
/// The signal only changes when a resize crosses the small-screen threshold. The resize
/// listener is removed when the owning view is disposed.
pub fn use_device_width() -> ReadSignal<DeviceWidth> {
    let (width, set_width) = signal(classify(inner_width()));

    let handle = window_event_listener(ev::resize, move |_ev: web_sys::UiEvent| {
        let next = classify(inner_width());
        if width.get_untracked() != next {
            set_width.set(next);
        }
    });
    on_cleanup(move || handle.remove());

    width
}
