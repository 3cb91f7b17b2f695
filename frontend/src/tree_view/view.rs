use shared::{NodeId, VisibleRow};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use zoon::*;

use super::{ScrollPosition, TreeSnapshot, TreeView};
use crate::dataflow::Relay;
use crate::debug_utils::debug_critical;

const INDENT_PX: u32 = 16;
// Rows rendered above and below the viewport so fast scrolling shows no gaps.
const OVERSCAN_ROWS: usize = 2;

const TEXT_COLOR: &str = "rgb(31, 41, 55)";
const MUTED_COLOR: &str = "rgb(107, 114, 128)";
const ERROR_COLOR: &str = "rgb(185, 28, 28)";
const BORDER_COLOR: &str = "rgb(209, 213, 219)";
const BUTTON_BACKGROUND: &str = "rgb(243, 244, 246)";

#[derive(Clone)]
struct RowContext {
    line_height: u32,
    label_clicked_relay: Relay<NodeId>,
    chevron_clicked_relay: Relay<NodeId>,
}

pub fn tree_view_panel(tree_view: &TreeView) -> impl Element + use<> {
    Column::new()
        .s(Width::exact(480))
        .s(Gap::new().y(8))
        .s(Padding::all(16))
        .s(Font::new().color(TEXT_COLOR))
        .item(
            Row::new()
                .s(Gap::new().x(8))
                .item(control_button(
                    "Expand All",
                    tree_view.expand_all_clicked_relay.clone(),
                ))
                .item(control_button(
                    "Collapse All",
                    tree_view.collapse_all_clicked_relay.clone(),
                )),
        )
        .item(
            El::new()
                .s(Font::new().size(12).color(MUTED_COLOR))
                .child(Text::with_signal(
                    tree_view.snapshot.signal_ref(|snapshot| snapshot.status_text()),
                )),
        )
        .item(virtual_rows(tree_view))
}

fn control_button(label: &str, clicked_relay: Relay) -> impl Element + use<> {
    Button::new()
        .s(Padding::new().x(12).y(4))
        .s(RoundedCorners::all(4))
        .s(Borders::all(Border::new().width(1).color(BORDER_COLOR)))
        .s(Background::new().color(BUTTON_BACKGROUND))
        .s(Font::new().size(13))
        .label(label.to_string())
        .on_press(move || clicked_relay.send(()))
}

/// Scroll container of the configured height over a full-height stack.
/// Only the rows near the viewport are in the DOM.
fn virtual_rows(tree_view: &TreeView) -> impl Element + use<> {
    let viewport_height = tree_view.config.viewport_height;
    let scroll_top = Mutable::new(0.0);
    let context = RowContext {
        line_height: tree_view.config.row_height.round() as u32,
        label_clicked_relay: tree_view.label_clicked_relay.clone(),
        chevron_clicked_relay: tree_view.chevron_clicked_relay.clone(),
    };

    El::new()
        .s(Width::fill())
        .s(Height::exact(viewport_height.round() as u32))
        .s(Borders::all(Border::new().width(1).color(BORDER_COLOR)))
        .s(RoundedCorners::all(4))
        .update_raw_el({
            let scrolled_relay = tree_view.scrolled_relay.clone();
            let scroll_top = scroll_top.clone();
            move |raw_el| {
                if let Some(html_el) = raw_el.dom_element().dyn_ref::<web_sys::HtmlElement>() {
                    let scroll_closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
                        // Bounds come from the element that fired, read at event time.
                        let Some(viewport) = event
                            .current_target()
                            .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
                        else {
                            return;
                        };
                        let position = ScrollPosition {
                            offset: viewport.scroll_top() as f64,
                            viewport_height: viewport.client_height() as f64,
                        };
                        scroll_top.set_neq(position.offset);
                        scrolled_relay.send(position);
                    }) as Box<dyn FnMut(web_sys::Event)>);

                    if let Err(error) = html_el.add_event_listener_with_callback(
                        "scroll",
                        scroll_closure.as_ref().unchecked_ref(),
                    ) {
                        debug_critical(&format!("Failed to attach scroll listener: {error:?}"));
                    }
                    scroll_closure.forget();
                }
                raw_el
                    .style("overflow-y", "auto")
                    .style("scrollbar-width", "thin")
            }
        })
        .child_signal(
            map_ref! {
                let snapshot = tree_view.snapshot.signal(),
                let scroll_top = scroll_top.signal() => (snapshot.clone(), *scroll_top)
            }
            .map(move |(snapshot, scroll_top)| {
                rendered_window(&snapshot, scroll_top, viewport_height, &context)
            }),
        )
}

fn rendered_window(
    snapshot: &TreeSnapshot,
    scroll_top: f64,
    viewport_height: f64,
    context: &RowContext,
) -> impl Element + use<> {
    let layout = &snapshot.layout;
    let indices = layout
        .visible_range(scroll_top, viewport_height)
        .map(|range| {
            let last = layout.len() - 1;
            range.start_index.saturating_sub(OVERSCAN_ROWS)
                ..=(range.stop_index + OVERSCAN_ROWS).min(last)
        });

    Stack::new()
        .s(Width::fill())
        .s(Height::exact(layout.total_height().ceil() as u32))
        .layers(
            indices
                .into_iter()
                .flatten()
                .filter_map(|index| virtual_row(snapshot, index, context)),
        )
}

/// One top-level row: a root and its visible subtree. Rows taller than their
/// slot are clipped.
fn virtual_row(
    snapshot: &TreeSnapshot,
    index: usize,
    context: &RowContext,
) -> Option<impl Element + use<>> {
    let root = snapshot.forest.get(index)?;
    let top = snapshot.layout.row_offset(index)?;
    let height = snapshot.layout.row_height_at(index)?;

    Some(
        Column::new()
            .s(Width::fill())
            .s(Height::exact(height.round() as u32))
            .s(Transform::new().move_down(top.round() as i32))
            .update_raw_el(|raw_el| raw_el.style("overflow", "hidden"))
            .items(
                root.visible_rows(&snapshot.expansion)
                    .into_iter()
                    .map(|row| tree_line(row, snapshot, context)),
            ),
    )
}

fn tree_line(
    row: VisibleRow,
    snapshot: &TreeSnapshot,
    context: &RowContext,
) -> impl Element + use<> {
    let line = Row::new()
        .s(Width::fill())
        .s(Height::exact(context.line_height))
        .s(Padding::new().left(row.depth() as u32 * INDENT_PX + 4))
        .s(Gap::new().x(4))
        .s(Align::new().center_y())
        .s(Font::new().size(13).no_wrap());

    match row {
        VisibleRow::Node {
            node_id,
            label,
            expanded,
            leaf,
            ..
        } => line
            .item(chevron(node_id, expanded, leaf, context))
            .item(node_label(
                node_id,
                label,
                snapshot.is_node_loading(node_id),
                context,
            )),
        VisibleRow::Loading { .. } => line.item(
            El::new()
                .s(Font::new().italic().color(MUTED_COLOR))
                .child("Loading…"),
        ),
        VisibleRow::Failed { error, .. } => line.item(
            El::new()
                .s(Font::new().color(ERROR_COLOR))
                .update_raw_el(move |raw_el| raw_el.attr("title", &error.to_string()))
                .child("Can't load children"),
        ),
    }
}

fn chevron(
    node_id: NodeId,
    expanded: bool,
    leaf: bool,
    context: &RowContext,
) -> impl Element + use<> {
    let chevron_clicked_relay = context.chevron_clicked_relay.clone();
    let symbol = match (leaf, expanded) {
        (true, _) => "",
        (false, true) => "▼",
        (false, false) => "▶",
    };

    El::new()
        .s(Width::exact(14))
        .s(Font::new().size(10).color(MUTED_COLOR))
        .s(Cursor::new(if leaf {
            CursorIcon::Default
        } else {
            CursorIcon::Pointer
        }))
        .child(symbol)
        .on_click(move || {
            if !leaf {
                chevron_clicked_relay.send(node_id);
            }
        })
}

/// Clicking the label toggles the node, except while its children load.
fn node_label(
    node_id: NodeId,
    label: String,
    loading: bool,
    context: &RowContext,
) -> impl Element + use<> {
    let label_clicked_relay = context.label_clicked_relay.clone();

    Row::new()
        .s(Gap::new().x(6))
        .s(Cursor::new(if loading {
            CursorIcon::Wait
        } else {
            CursorIcon::Pointer
        }))
        .item(El::new().child(label))
        .item(loading.then(|| {
            El::new()
                .s(Font::new().size(11).italic().color(MUTED_COLOR))
                .child("loading…")
        }))
        .on_click(move || {
            if !loading {
                label_clicked_relay.send(node_id);
            }
        })
}
