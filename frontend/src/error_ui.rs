use futures::{FutureExt, select, stream::StreamExt};
use zoon::events::Click;
use zoon::*;

use crate::dataflow::{Actor, relay};
use crate::error_display::{ErrorAlert, ErrorDisplay};

/// Remaining auto-dismiss time in percent (100.0 down to 0.0)
type Progress = f32;

const UPDATE_INTERVAL_MS: u32 = 50;

const ERROR_BACKGROUND: &str = "rgb(254, 242, 242)";
const ERROR_BORDER: &str = "rgb(248, 113, 113)";
const ERROR_TITLE: &str = "rgb(153, 27, 27)";
const ERROR_TEXT: &str = "rgb(185, 28, 28)";
const ERROR_TRACK: &str = "rgb(254, 202, 202)";

/// Toast notifications pinned to the top right corner.
pub fn toast_notifications_container(errors: ErrorDisplay) -> impl Element {
    El::new()
        .s(Width::fill())
        .s(Height::fill())
        .s(Align::new().top().right())
        .s(Padding::all(16))
        .update_raw_el(|raw_el| {
            raw_el
                .style("position", "fixed")
                .style("top", "0")
                .style("left", "0")
                .style("pointer-events", "none") // clicks pass through empty areas
                .style("z-index", "1000")
        })
        .child(
            Column::new()
                .s(Gap::new().y(8))
                .s(Width::exact(360))
                .s(Align::new().top().right())
                .update_raw_el(|raw_el| raw_el.style("pointer-events", "auto"))
                .items_signal_vec(errors.active_toasts.signal_vec().map({
                    let errors = errors.clone();
                    move |alert| toast_element(alert, errors.clone())
                })),
        )
}

/// One toast. Clicking it pauses the auto-dismiss countdown.
fn toast_element(alert: ErrorAlert, errors: ErrorDisplay) -> impl Element {
    let (toast_clicked_relay, mut toast_clicked_stream) = relay();
    let (dismiss_button_clicked_relay, mut dismiss_button_clicked_stream) = relay();
    let auto_dismiss_ms = alert.auto_dismiss_ms as f32;
    let alert_id = alert.id.clone();

    let toast_actor = Actor::new(100.0 as Progress, async move |state| {
        let mut elapsed_ms = 0.0f32;
        let mut is_paused = auto_dismiss_ms <= 0.0;

        loop {
            select! {
                _ = Timer::sleep(UPDATE_INTERVAL_MS).fuse() => {
                    if !is_paused {
                        elapsed_ms += UPDATE_INTERVAL_MS as f32;
                        let remaining = 100.0 - (elapsed_ms / auto_dismiss_ms * 100.0);
                        state.set(remaining.max(0.0));

                        if elapsed_ms >= auto_dismiss_ms {
                            errors.dismiss(&alert_id);
                            break;
                        }
                    }
                }
                event = toast_clicked_stream.next() => {
                    if event.is_some() && auto_dismiss_ms > 0.0 {
                        is_paused = !is_paused;
                    }
                }
                event = dismiss_button_clicked_stream.next() => {
                    if event.is_some() {
                        errors.dismiss(&alert_id);
                        break;
                    }
                }
            }
        }
    });

    Column::new()
        .s(Width::fill())
        .s(Background::new().color(ERROR_BACKGROUND))
        .s(Borders::all(Border::new().width(1).color(ERROR_BORDER)))
        .s(RoundedCorners::all(8))
        .s(Shadows::new(vec![
            Shadow::new().color(hsluv!(0, 0, 0, 10)).x(0).y(2).blur(8),
        ]))
        .s(Cursor::new(CursorIcon::Pointer))
        .update_raw_el(|raw_el| raw_el.attr("title", "Click to pause/resume auto-dismiss"))
        .on_click(move || toast_clicked_relay.send(()))
        .item(
            Row::new()
                .s(Width::fill())
                .s(Padding::all(12))
                .s(Gap::new().x(8))
                .s(Align::new().center_y())
                .item(El::new().s(Font::new().size(18).color(ERROR_BORDER)).child("⚠"))
                .item(
                    Column::new()
                        .s(Width::fill())
                        .s(Gap::new().y(4))
                        .item(
                            El::new()
                                .s(Font::new()
                                    .size(15)
                                    .weight(FontWeight::SemiBold)
                                    .color(ERROR_TITLE))
                                .child(&alert.title),
                        )
                        .item(
                            El::new()
                                .s(Font::new().size(13).color(ERROR_TEXT).wrap_anywhere())
                                .child(&alert.message),
                        ),
                )
                .item(
                    El::new()
                        .s(Font::new().size(14).color(ERROR_TEXT))
                        .s(Cursor::new(CursorIcon::Pointer))
                        .s(Padding::all(4))
                        .s(RoundedCorners::all(4))
                        .child("✕")
                        .update_raw_el(move |raw_el| {
                            raw_el.event_handler(move |event: Click| {
                                event.stop_propagation();
                                dismiss_button_clicked_relay.send(());
                            })
                        }),
                ),
        )
        .item(
            El::new()
                .s(Width::fill())
                .s(Height::exact(3))
                .s(Background::new().color(ERROR_TRACK))
                .child(
                    El::new()
                        .s(Height::fill())
                        .s(Width::percent_signal(toast_actor.signal()))
                        .s(Background::new().color(ERROR_BORDER))
                        .s(Transitions::new([Transition::property("width").duration(150)])),
                ),
        )
        .after_remove(move |_| {
            drop(toast_actor);
        })
}
