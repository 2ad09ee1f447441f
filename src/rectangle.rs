#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rectangle {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rectangle {
    /// US Letter, the size used when a page does not say how big it is.
    pub const LETTER: Rectangle = Rectangle {
        x1: 0.0,
        y1: 0.0,
        x2: 612.0,
        y2: 792.0,
    };

    /// PDF allows any two opposite corners, make `(x1, y1)` the lower left one.
    pub fn normalized(self) -> Self {
        Rectangle {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Containment check that tolerates float rounding.
    pub fn contains(&self, other: &Rectangle) -> bool {
        const EPSILON: f32 = 1e-3;
        other.x1 >= self.x1 - EPSILON
            && other.y1 >= self.y1 - EPSILON
            && other.x2 <= self.x2 + EPSILON
            && other.y2 <= self.y2 + EPSILON
    }
}
