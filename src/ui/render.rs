//! Paints the document with egui and collects the commands of clicked nodes.

use super::document::{Anchor, Command, Document, NodeId, Tag};
use eframe::egui::{self, Color32};

/// Children of a node with this class are laid out in their own areas, each
/// at its own offsets, over a dimmed screen.
const OVERLAY_CLASS: &str = "dialog";

pub fn paint(ctx: &egui::Context, doc: &mut Document) -> Vec<Command> {
    let screen = ctx.screen_rect();
    let mut commands = Vec::new();
    let mut measured = Vec::new();

    for &id in doc.children(doc.body()) {
        let node = doc.node(id);
        if !node.style.visible {
            continue;
        }

        if node.has_class(OVERLAY_CLASS) {
            ctx.layer_painter(egui::LayerId::new(
                egui::Order::Middle,
                egui::Id::new(("overlay", id)),
            ))
            .rect_filled(screen, egui::CornerRadius::ZERO, Color32::from_black_alpha(120));

            for &child in doc.children(id) {
                if doc.style(child).visible {
                    measured.push(paint_area(ctx, doc, child, screen, &mut commands));
                }
            }
        } else {
            measured.push(paint_area(ctx, doc, id, screen, &mut commands));
        }
    }

    for (id, size) in measured {
        doc.set_size(id, size.x, size.y);
    }
    commands
}

fn paint_area(
    ctx: &egui::Context,
    doc: &Document,
    id: NodeId,
    screen: egui::Rect,
    commands: &mut Vec<Command>,
) -> (NodeId, egui::Vec2) {
    let style = doc.style(id);
    let top = match style.anchor {
        Anchor::Top => style.top,
        Anchor::Bottom => screen.height() - style.bottom - style.height,
    };

    let response = egui::Area::new(egui::Id::new(("node", id)))
        .order(egui::Order::Foreground)
        .fixed_pos(egui::pos2(style.left, top))
        .show(ctx, |ui| {
            egui::Frame::window(ui.style()).show(ui, |ui| {
                paint_node(ui, doc, id, commands);
            });
        })
        .response;

    (id, response.rect.size())
}

fn paint_node(ui: &mut egui::Ui, doc: &Document, id: NodeId, commands: &mut Vec<Command>) {
    let node = doc.node(id);
    if !node.style.visible {
        return;
    }

    match node.tag {
        Tag::Heading => {
            ui.heading(plain_text(&node.markup));
        }
        Tag::Button => {
            let response = ui.selectable_label(node.has_class("active"), plain_text(&node.markup));
            let response = if node.title.is_empty() {
                response
            } else {
                response.on_hover_text(node.title.as_str())
            };
            if response.clicked() {
                if let Some(command) = &node.on_click {
                    commands.push(command.clone());
                }
            }
        }
        Tag::Div | Tag::List | Tag::ListItem => {
            if node.has_class("title") {
                ui.strong(plain_text(&node.markup));
            } else if !node.markup.is_empty() {
                ui.label(plain_text(&node.markup));
            } else if doc.children(id).is_empty() && !node.title.is_empty() {
                ui.colored_label(Color32::LIGHT_RED, "●")
                    .on_hover_text(node.title.as_str());
            }

            if node.has_class("buttons") {
                ui.horizontal(|ui| {
                    for &child in doc.children(id) {
                        paint_node(ui, doc, child, commands);
                    }
                });
            } else {
                for &child in doc.children(id) {
                    paint_node(ui, doc, child, commands);
                }
            }
        }
    }
}

/// Markup reduced to its text: tags dropped, whitespace collapsed. Entities
/// such as `&lt;` are left undecoded.
pub fn plain_text(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
