/// Clipped RGBA drawing over a borrowed framebuffer. Every primitive
/// silently drops pixels that fall outside the buffer.
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub(crate) fn put(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let Some(offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
            .and_then(|pixel| pixel.checked_mul(4))
        else {
            return;
        };
        let Some(slot) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        if color[3] == u8::MAX {
            slot.copy_from_slice(&color);
        } else {
            blend_into(slot, color);
        }
    }

    pub(crate) fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: [u8; 4]) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(w).min(self.width as i32);
        let end_y = y.saturating_add(h).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.put(px, py, color);
            }
        }
    }

    pub(crate) fn outline_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: [u8; 4]) {
        if w <= 1 || h <= 1 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y + 1, 1, h - 2, color);
        self.fill_rect(x + w - 1, y + 1, 1, h - 2, color);
    }

    pub(crate) fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        if radius <= 0 {
            self.put(cx, cy, color);
            return;
        }
        let r2 = i64::from(radius) * i64::from(radius);
        for dy in -radius..=radius {
            let y = cy + dy;
            if y < 0 || y >= self.height as i32 {
                continue;
            }
            let span = ((r2 - i64::from(dy) * i64::from(dy)) as f64).sqrt() as i32;
            let start = (cx - span).max(0);
            let end = (cx + span).min(self.width as i32 - 1);
            for x in start..=end {
                self.put(x, y, color);
            }
        }
    }

    pub(crate) fn circle_outline(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        if radius <= 0 {
            return;
        }
        // Midpoint circle.
        let mut x = radius;
        let mut y = 0;
        let mut error = 1 - radius;
        while x >= y {
            for (px, py) in [
                (x, y),
                (y, x),
                (-y, x),
                (-x, y),
                (-x, -y),
                (-y, -x),
                (y, -x),
                (x, -y),
            ] {
                self.put(cx + px, cy + py, color);
            }
            y += 1;
            if error < 0 {
                error += 2 * y + 1;
            } else {
                x -= 1;
                error += 2 * (y - x) + 1;
            }
        }
    }

    pub(crate) fn line(&mut self, from: (i32, i32), to: (i32, i32), color: [u8; 4]) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let step_x = if x < to.0 { 1 } else { -1 };
        let step_y = if y < to.1 { 1 } else { -1 };
        let mut error = dx + dy;
        loop {
            self.put(x, y, color);
            if x == to.0 && y == to.1 {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }

    pub(crate) fn fill_triangle(&mut self, points: [(i32, i32); 3], color: [u8; 4]) {
        let min_x = points.iter().map(|p| p.0).min().unwrap_or(0).max(0);
        let max_x = points
            .iter()
            .map(|p| p.0)
            .max()
            .unwrap_or(0)
            .min(self.width as i32 - 1);
        let min_y = points.iter().map(|p| p.1).min().unwrap_or(0).max(0);
        let max_y = points
            .iter()
            .map(|p| p.1)
            .max()
            .unwrap_or(0)
            .min(self.height as i32 - 1);
        let [a, b, c] = points;
        let area = edge(a, b, c);
        if area == 0 {
            self.line(a, b, color);
            self.line(b, c, color);
            return;
        }
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x, y);
                let w0 = edge(b, c, p);
                let w1 = edge(c, a, p);
                let w2 = edge(a, b, p);
                let inside = if area > 0 {
                    w0 >= 0 && w1 >= 0 && w2 >= 0
                } else {
                    w0 <= 0 && w1 <= 0 && w2 <= 0
                };
                if inside {
                    self.put(x, y, color);
                }
            }
        }
    }
}

fn edge(a: (i32, i32), b: (i32, i32), p: (i32, i32)) -> i64 {
    i64::from(b.0 - a.0) * i64::from(p.1 - a.1) - i64::from(b.1 - a.1) * i64::from(p.0 - a.0)
}

fn blend_into(slot: &mut [u8], color: [u8; 4]) {
    let alpha = u16::from(color[3]);
    let inverse = 255 - alpha;
    for channel in 0..3 {
        let mixed = (u16::from(color[channel]) * alpha + u16::from(slot[channel]) * inverse) / 255;
        slot[channel] = mixed as u8;
    }
    slot[3] = u8::MAX;
}
