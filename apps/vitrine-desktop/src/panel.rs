use vitrine_common::Color;
use vitrine_tools::{Control, ControlError, ControlKind, ControlPanel, ControlValue};

/// Draw every control, loose ones first, then one collapsible section per
/// folder. Edits go straight into `panel`.
pub fn controls_ui(ui: &mut egui::Ui, panel: &mut ControlPanel) {
    if panel.is_empty() {
        ui.weak("No controls");
        return;
    }
    let snapshot: Vec<Control> = panel.controls().to_vec();
    for control in snapshot.iter().filter(|c| c.folder.is_none()) {
        control_ui(ui, panel, control);
    }
    let folders: Vec<String> = panel.folders().into_iter().map(str::to_string).collect();
    for folder in folders {
        egui::CollapsingHeader::new(&folder)
            .default_open(true)
            .show(ui, |ui| {
                for control in snapshot
                    .iter()
                    .filter(|c| c.folder.as_deref() == Some(folder.as_str()))
                {
                    control_ui(ui, panel, control);
                }
            });
    }
}

fn control_ui(ui: &mut egui::Ui, panel: &mut ControlPanel, control: &Control) {
    let key = control.key.as_str();
    let label = control.label.as_str();
    let result = match (&control.kind, control.value()) {
        (ControlKind::Number { min, max, step }, ControlValue::Number(mut v)) => {
            let slider = egui::Slider::new(&mut v, *min..=*max)
                .step_by(f64::from(*step))
                .text(label);
            if ui.add(slider).changed() {
                panel.set_number(key, v)
            } else {
                Ok(())
            }
        }
        (ControlKind::Toggle, ControlValue::Toggle(mut on)) => {
            if ui.checkbox(&mut on, label).changed() {
                panel.set_toggle(key, on)
            } else {
                Ok(())
            }
        }
        (ControlKind::Color, ControlValue::Color(color)) => {
            let mut rgb = srgb_bytes(color);
            let changed = ui
                .horizontal(|ui| {
                    let changed = ui.color_edit_button_srgb(&mut rgb).changed();
                    ui.label(label);
                    changed
                })
                .inner;
            if changed {
                panel.set_color(key, from_srgb_bytes(rgb))
            } else {
                Ok(())
            }
        }
        (ControlKind::Choice { options }, ControlValue::Choice(mut index)) => {
            let selected = options.get(index).map(String::as_str).unwrap_or("");
            let before = index;
            egui::ComboBox::from_label(label)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for (i, option) in options.iter().enumerate() {
                        ui.selectable_value(&mut index, i, option);
                    }
                });
            if index != before {
                panel.set_choice(key, index)
            } else {
                Ok(())
            }
        }
        _ => Err(ControlError::WrongKind {
            key: key.to_string(),
            expected: "value matching its kind",
        }),
    };
    if let Err(e) = result {
        tracing::warn!(control = key, "control edit rejected: {e}");
    }
}

fn srgb_bytes(color: Color) -> [u8; 3] {
    let hex = color.to_hex();
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}

fn from_srgb_bytes(rgb: [u8; 3]) -> Color {
    Color::from_hex(u32::from(rgb[0]) << 16 | u32::from(rgb[1]) << 8 | u32::from(rgb[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_bytes_round_trip_hex() {
        let color = Color::from_hex(0x8f8f8f);
        assert_eq!(srgb_bytes(color), [0x8f, 0x8f, 0x8f]);
        assert_eq!(from_srgb_bytes([0x12, 0x34, 0x56]).to_hex(), 0x123456);
    }
}
