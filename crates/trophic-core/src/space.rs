use rand::Rng;

pub type Position = [f64; 2];

/// Toroidal surface `[0, width) x [0, height)`. Coordinates wrap, never clamp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Torus {
    width: f64,
    height: f64,
}

impl Torus {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "torus dimensions must be positive");
        Self {
            width: f64::from(width),
            height: f64::from(height),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn contains(&self, p: Position) -> bool {
        (0.0..self.width).contains(&p[0]) && (0.0..self.height).contains(&p[1])
    }

    pub fn wrap(&self, p: Position) -> Position {
        [wrap_coord(p[0], self.width), wrap_coord(p[1], self.height)]
    }

    /// Shortest displacement from `from` to `to` across the wrap seams.
    pub fn delta(&self, from: Position, to: Position) -> [f64; 2] {
        [
            wrapped_delta(to[0] - from[0], self.width),
            wrapped_delta(to[1] - from[1], self.height),
        ]
    }

    pub fn distance_sq(&self, a: Position, b: Position) -> f64 {
        let [dx, dy] = self.delta(a, b);
        dx * dx + dy * dy
    }

    pub fn distance(&self, a: Position, b: Position) -> f64 {
        self.distance_sq(a, b).sqrt()
    }

    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        self.wrap([
            rng.random::<f64>() * self.width,
            rng.random::<f64>() * self.height,
        ])
    }
}

fn wrap_coord(value: f64, size: f64) -> f64 {
    let wrapped = value.rem_euclid(size);
    // rem_euclid can round up to `size` for tiny negative inputs.
    if wrapped >= size {
        0.0
    } else {
        wrapped
    }
}

pub(crate) fn wrapped_delta(delta: f64, size: f64) -> f64 {
    (delta + size / 2.0).rem_euclid(size) - size / 2.0
}
