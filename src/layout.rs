//! Geometry of the signature block.
//!
//! The block is described once, as a template in design units of a
//! 170 by 100 box. A [`LayoutVariant`] only decides the real size of the box
//! and where on the page it goes; every element is scaled from the template.

use crate::rectangle::Rectangle;

/// Distance kept between the block and the page edges when the page is big enough.
pub const PAGE_MARGIN: f32 = 50.0;

pub(crate) const DESIGN_WIDTH: f32 = 170.0;
pub(crate) const DESIGN_HEIGHT: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutVariant {
    /// 170 x 100 near the top of the page, used for local certificate files.
    Compact,
    /// 400 x 200 near the bottom of the page, used for catalog certificates.
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerticalAnchor {
    Top,
    Bottom,
}

struct VariantFrame {
    width: f32,
    height: f32,
    anchor: VerticalAnchor,
}

impl LayoutVariant {
    fn frame(&self) -> VariantFrame {
        match self {
            LayoutVariant::Compact => VariantFrame {
                width: 170.0,
                height: 100.0,
                anchor: VerticalAnchor::Top,
            },
            LayoutVariant::Large => VariantFrame {
                width: 400.0,
                height: 200.0,
                anchor: VerticalAnchor::Bottom,
            },
        }
    }

    /// Nominal size of the block, before it is fitted to the page.
    pub fn size(&self) -> (f32, f32) {
        let frame = self.frame();
        (frame.width, frame.height)
    }

    /// Work out where the block goes on a page.
    ///
    /// The block is shrunk (keeping its aspect ratio) when the page is smaller
    /// than the block, and the margin shrinks when the page is only slightly
    /// bigger, so the block always stays inside `page`.
    pub fn place(&self, page: &Rectangle) -> Option<BlockGeometry> {
        let page = page.normalized();
        if page.width() <= 0.0 || page.height() <= 0.0 {
            return None;
        }
        let frame = self.frame();
        let fit = (page.width() / frame.width)
            .min(page.height() / frame.height)
            .min(1.0);
        let width = frame.width * fit;
        let height = frame.height * fit;
        let margin_x = PAGE_MARGIN.min(((page.width() - width) / 2.0).max(0.0));
        let margin_y = PAGE_MARGIN.min(((page.height() - height) / 2.0).max(0.0));

        let x = page.x1 + margin_x;
        let y = match frame.anchor {
            VerticalAnchor::Top => page.y2 - height - margin_y,
            VerticalAnchor::Bottom => page.y1 + margin_y,
        };
        Some(BlockGeometry {
            bounds: Rectangle {
                x1: x,
                y1: y,
                x2: x + width,
                y2: y + height,
            },
            scale_x: width / DESIGN_WIDTH,
            scale_y: height / DESIGN_HEIGHT,
        })
    }
}

/// Where the block ended up, and how design units map onto page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockGeometry {
    pub bounds: Rectangle,
    scale_x: f32,
    scale_y: f32,
}

impl BlockGeometry {
    pub(crate) fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.bounds.x1 + x * self.scale_x,
            self.bounds.y1 + y * self.scale_y,
        )
    }

    pub(crate) fn width(&self, width: f32) -> f32 {
        width * self.scale_x
    }

    pub(crate) fn height(&self, height: f32) -> f32 {
        height * self.scale_y
    }

    /// Scale for things that must keep their proportions: fonts, radii, line widths.
    pub(crate) fn uniform(&self, value: f32) -> f32 {
        value * self.scale_x.min(self.scale_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
}

/// Area of the block an element occupies, in design units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Region {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
    },
    Segment {
        from: (f32, f32),
        to: (f32, f32),
    },
    /// Baseline start of a single line of text.
    Anchor { x: f32, y: f32 },
    /// Baseline start of the first of several lines, going down.
    Column { x: f32, top: f32, line_height: f32 },
}

/// What to put in a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ContentRule {
    Fill(Rgb),
    Stroke {
        color: Rgb,
        width: f32,
    },
    FillStroke {
        fill: Rgb,
        stroke: Rgb,
        width: f32,
    },
    Label {
        text: &'static str,
        size: f32,
        color: Rgb,
    },
    SignerName {
        size: f32,
        color: Rgb,
    },
    /// The detail lines; the first one (`Signed by:`) gets the lead style.
    DetailLines {
        lead_size: f32,
        lead_color: Rgb,
        size: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TemplateElement {
    pub region: Region,
    pub rule: ContentRule,
}

pub(crate) const HEADER_LABEL: &str = "DIGITALLY SIGNED";
pub(crate) const SMALL_PRINT_LABEL: &str = "Digital Signature";
pub(crate) const BADGE_LABEL: &str = "CA Verified";

const HEADER_BLUE: Rgb = Rgb(0.0, 0.2, 0.8);
const VERIFIED_GREEN: Rgb = Rgb(0.0, 0.7, 0.0);
const BADGE_GREEN: Rgb = Rgb(0.0, 0.6, 0.0);

/// Drawing order matters, later elements paint over earlier ones.
pub(crate) const SIGNATURE_BLOCK_TEMPLATE: [TemplateElement; 14] = [
    // Background
    TemplateElement {
        region: Region::Rect {
            x: 0.0,
            y: 0.0,
            width: DESIGN_WIDTH,
            height: DESIGN_HEIGHT,
        },
        rule: ContentRule::Fill(Rgb::WHITE),
    },
    // Border
    TemplateElement {
        region: Region::Rect {
            x: 0.0,
            y: 0.0,
            width: DESIGN_WIDTH,
            height: DESIGN_HEIGHT,
        },
        rule: ContentRule::Stroke {
            color: HEADER_BLUE,
            width: 3.0,
        },
    },
    // Header bar
    TemplateElement {
        region: Region::Rect {
            x: 3.0,
            y: 80.0,
            width: 164.0,
            height: 17.0,
        },
        rule: ContentRule::Fill(Rgb(0.7, 0.85, 1.0)),
    },
    TemplateElement {
        region: Region::Anchor { x: 10.0, y: 85.0 },
        rule: ContentRule::Label {
            text: HEADER_LABEL,
            size: 10.0,
            color: Rgb(0.0, 0.0, 0.6),
        },
    },
    // Verified mark
    TemplateElement {
        region: Region::Circle {
            x: 155.0,
            y: 90.0,
            radius: 6.0,
        },
        rule: ContentRule::Fill(VERIFIED_GREEN),
    },
    TemplateElement {
        region: Region::Anchor { x: 152.0, y: 86.0 },
        rule: ContentRule::Label {
            text: "V",
            size: 8.0,
            color: Rgb::WHITE,
        },
    },
    // Name panel
    TemplateElement {
        region: Region::Rect {
            x: 8.0,
            y: 52.0,
            width: 154.0,
            height: 23.0,
        },
        rule: ContentRule::FillStroke {
            fill: Rgb(0.98, 0.98, 1.0),
            stroke: Rgb(0.7, 0.7, 0.7),
            width: 1.0,
        },
    },
    TemplateElement {
        region: Region::Anchor { x: 12.0, y: 63.0 },
        rule: ContentRule::SignerName {
            size: 11.0,
            color: Rgb(0.0, 0.0, 0.5),
        },
    },
    TemplateElement {
        region: Region::Segment {
            from: (10.0, 58.0),
            to: (160.0, 58.0),
        },
        rule: ContentRule::Stroke {
            color: Rgb::BLACK,
            width: 0.5,
        },
    },
    TemplateElement {
        region: Region::Anchor { x: 12.0, y: 54.0 },
        rule: ContentRule::Label {
            text: SMALL_PRINT_LABEL,
            size: 6.0,
            color: Rgb(0.4, 0.4, 0.4),
        },
    },
    // Details
    TemplateElement {
        region: Region::Column {
            x: 8.0,
            top: 42.0,
            line_height: 8.0,
        },
        rule: ContentRule::DetailLines {
            lead_size: 7.0,
            lead_color: Rgb::BLACK,
            size: 6.0,
            color: Rgb(0.3, 0.3, 0.3),
        },
    },
    // Verification badge
    TemplateElement {
        region: Region::Rect {
            x: 5.0,
            y: 4.0,
            width: 160.0,
            height: 12.0,
        },
        rule: ContentRule::FillStroke {
            fill: Rgb(0.9, 1.0, 0.9),
            stroke: BADGE_GREEN,
            width: 1.0,
        },
    },
    TemplateElement {
        region: Region::Circle {
            x: 12.0,
            y: 10.0,
            radius: 3.0,
        },
        rule: ContentRule::Fill(BADGE_GREEN),
    },
    TemplateElement {
        region: Region::Anchor { x: 18.0, y: 7.0 },
        rule: ContentRule::Label {
            text: BADGE_LABEL,
            size: 7.0,
            color: Rgb(0.0, 0.5, 0.0),
        },
    },
];
