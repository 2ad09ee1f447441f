//! Turns the layout template plus a signer into PDF drawing operations.

use crate::identity::CertificateIdentity;
use crate::layout::{BlockGeometry, ContentRule, Region, Rgb, SIGNATURE_BLOCK_TEMPLATE};
use chrono::{DateTime, Utc};
use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

/// Number of thumbprint characters printed before the ellipsis.
pub const THUMBPRINT_VISIBLE_CHARS: usize = 25;
pub const ELLIPSIS: &str = "...";

// Control points for a quarter circle drawn with a cubic Bezier.
const KAPPA: f32 = 0.552_284_8;

/// Everything printed on a signature block that depends on the signer.
#[derive(Debug, Clone)]
pub struct SignatureBlock<'a> {
    pub identity: &'a CertificateIdentity,
    pub signer_name: &'a str,
    pub signed_at: DateTime<Utc>,
    pub date_format: &'a str,
}

impl<'a> SignatureBlock<'a> {
    /// The lines under the name panel, top to bottom.
    pub fn detail_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Signed by: {}", self.signer_name),
            format!("Date: {}", self.signed_at.format(self.date_format)),
        ];
        if let Some(valid_to) = &self.identity.valid_to {
            lines.push(format!("Valid until: {}", valid_to.format(self.date_format)));
        }
        if let Some(thumbprint) = &self.identity.thumbprint {
            lines.push(format!("Thumbprint: {}", truncate_thumbprint(thumbprint)));
        }
        lines
    }

    pub(crate) fn operations(&self, geometry: &BlockGeometry, font_name: &str) -> Vec<Operation> {
        let detail_lines = self.detail_lines();
        let mut operations = Vec::new();
        for element in SIGNATURE_BLOCK_TEMPLATE.iter() {
            match (element.region, element.rule) {
                (region, ContentRule::Fill(color)) => {
                    let mut ops = vec![fill_color(color)];
                    ops.extend(path(geometry, region));
                    ops.push(Operation::new("f", vec![]));
                    operations.extend(in_graphics_state(ops));
                }
                (region, ContentRule::Stroke { color, width }) => {
                    let mut ops = vec![stroke_color(color), line_width(geometry, width)];
                    ops.extend(path(geometry, region));
                    ops.push(Operation::new("S", vec![]));
                    operations.extend(in_graphics_state(ops));
                }
                (
                    region,
                    ContentRule::FillStroke {
                        fill,
                        stroke,
                        width,
                    },
                ) => {
                    let mut ops = vec![
                        fill_color(fill),
                        stroke_color(stroke),
                        line_width(geometry, width),
                    ];
                    ops.extend(path(geometry, region));
                    // `B` = Fill, then stroke the same path
                    ops.push(Operation::new("B", vec![]));
                    operations.extend(in_graphics_state(ops));
                }
                (Region::Anchor { x, y }, ContentRule::Label { text, size, color }) => {
                    operations.extend(text_line(geometry, font_name, (x, y), text, size, color));
                }
                (Region::Anchor { x, y }, ContentRule::SignerName { size, color }) => {
                    operations.extend(text_line(
                        geometry,
                        font_name,
                        (x, y),
                        self.signer_name,
                        size,
                        color,
                    ));
                }
                (
                    Region::Column { x, top, line_height },
                    ContentRule::DetailLines {
                        lead_size,
                        lead_color,
                        size,
                        color,
                    },
                ) => {
                    for (index, line) in detail_lines.iter().enumerate() {
                        let (size, color) = if index == 0 {
                            (lead_size, lead_color)
                        } else {
                            (size, color)
                        };
                        let y = top - line_height * index as f32;
                        operations.extend(text_line(geometry, font_name, (x, y), line, size, color));
                    }
                }
                (region, rule) => {
                    log::warn!("Template element {:?} can not hold {:?}.", region, rule);
                }
            }
        }
        operations
    }
}

/// First 25 characters and an ellipsis, or the thumbprint as is when shorter.
pub fn truncate_thumbprint(thumbprint: &str) -> String {
    if thumbprint.chars().count() >= THUMBPRINT_VISIBLE_CHARS {
        let visible: String = thumbprint.chars().take(THUMBPRINT_VISIBLE_CHARS).collect();
        format!("{}{}", visible, ELLIPSIS)
    } else {
        thumbprint.to_owned()
    }
}

/// Encode text for the standard 14 fonts with `WinAnsiEncoding`.
///
/// Latin-1 maps one to one. Romanian comma and cedilla letters and the breve
/// `a` lose their accent, other characters outside the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|char| match char {
            ' '..='~' | '\u{A0}'..='\u{FF}' => char as u8,
            'ă' => b'a',
            'Ă' => b'A',
            'ș' | 'ş' => b's',
            'Ș' | 'Ş' => b'S',
            'ț' | 'ţ' => b't',
            'Ț' | 'Ţ' => b'T',
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

fn in_graphics_state(operations: Vec<Operation>) -> Vec<Operation> {
    let mut wrapped = Vec::with_capacity(operations.len() + 2);
    // `q` = Save graphics state
    wrapped.push(Operation::new("q", vec![]));
    wrapped.extend(operations);
    // `Q` = Restore graphics state
    wrapped.push(Operation::new("Q", vec![]));
    wrapped
}

fn fill_color(color: Rgb) -> Operation {
    Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()])
}

fn stroke_color(color: Rgb) -> Operation {
    Operation::new("RG", vec![color.0.into(), color.1.into(), color.2.into()])
}

fn line_width(geometry: &BlockGeometry, width: f32) -> Operation {
    Operation::new("w", vec![geometry.uniform(width).into()])
}

fn path(geometry: &BlockGeometry, region: Region) -> Vec<Operation> {
    match region {
        Region::Rect {
            x,
            y,
            width,
            height,
        } => {
            let (x, y) = geometry.point(x, y);
            vec![Operation::new(
                "re",
                vec![
                    x.into(),
                    y.into(),
                    geometry.width(width).into(),
                    geometry.height(height).into(),
                ],
            )]
        }
        Region::Circle { x, y, radius } => {
            let (cx, cy) = geometry.point(x, y);
            circle(cx, cy, geometry.uniform(radius))
        }
        Region::Segment { from, to } => {
            let from = geometry.point(from.0, from.1);
            let to = geometry.point(to.0, to.1);
            vec![
                Operation::new("m", vec![from.0.into(), from.1.into()]),
                Operation::new("l", vec![to.0.into(), to.1.into()]),
            ]
        }
        Region::Anchor { .. } | Region::Column { .. } => vec![],
    }
}

fn circle(cx: f32, cy: f32, r: f32) -> Vec<Operation> {
    let k = r * KAPPA;
    let curve = |points: [f32; 6]| {
        Operation::new("c", points.iter().map(|value| (*value).into()).collect())
    };
    vec![
        Operation::new("m", vec![(cx + r).into(), cy.into()]),
        curve([cx + r, cy + k, cx + k, cy + r, cx, cy + r]),
        curve([cx - k, cy + r, cx - r, cy + k, cx - r, cy]),
        curve([cx - r, cy - k, cx - k, cy - r, cx, cy - r]),
        curve([cx + k, cy - r, cx + r, cy - k, cx + r, cy]),
        Operation::new("h", vec![]),
    ]
}

fn text_line(
    geometry: &BlockGeometry,
    font_name: &str,
    position: (f32, f32),
    text: &str,
    size: f32,
    color: Rgb,
) -> Vec<Operation> {
    let (x, y) = geometry.point(position.0, position.1);
    vec![
        Operation::new("BT", vec![]),
        fill_color(color),
        Operation::new(
            "Tf",
            vec![
                Object::Name(font_name.as_bytes().to_vec()),
                geometry.uniform(size).into(),
            ],
        ),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}
