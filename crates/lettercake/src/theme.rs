use eframe::egui::Color32;

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color32,
    pub foreground: Color32,
    pub muted: Color32,
    pub heading_color: Color32,
    pub card_background: Color32,
    pub card_border: Color32,
    pub pink: Color32,
    pub blue: Color32,
    pub purple: Color32,
    pub yellow: Color32,
    pub orange: Color32,
    pub gold: Color32,
    pub dark_red: Color32,
    pub mint: Color32,
    pub title_size: f32,
    pub subtitle_size: f32,
    pub body_size: f32,
    pub small_size: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::birthday()
    }
}

impl Theme {
    pub fn birthday() -> Self {
        Self {
            background: Color32::from_rgb(0xFD, 0xFB, 0xF7),
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x1A),
            muted: Color32::from_rgb(0x6B, 0x6B, 0x6B),
            heading_color: Color32::BLACK,
            card_background: Color32::WHITE,
            card_border: Color32::from_rgb(0xF8, 0xF5, 0xF0),
            pink: Color32::from_rgb(0xFF, 0x6B, 0x6B),
            blue: Color32::from_rgb(0x4E, 0xCD, 0xC4),
            purple: Color32::from_rgb(0x9B, 0x59, 0xB6),
            yellow: Color32::from_rgb(0xFF, 0xE6, 0x6D),
            orange: Color32::from_rgb(0xFF, 0x9F, 0x43),
            gold: Color32::from_rgb(0xFF, 0xD7, 0x00),
            dark_red: Color32::from_rgb(0x7A, 0x1F, 0x28),
            mint: Color32::from_rgb(0xCF, 0xE8, 0xCC),
            title_size: 44.0,
            subtitle_size: 22.0,
            body_size: 18.0,
            small_size: 13.0,
        }
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(
            color.r(),
            color.g(),
            color.b(),
            (opacity.clamp(0.0, 1.0) * 255.0) as u8,
        )
    }

    /// Floating particles and the mini balloon row.
    pub fn balloon_palette(&self) -> [Color32; 5] {
        [self.pink, self.purple, self.blue, self.yellow, self.orange]
    }

    /// Confetti and mouse trail sparks.
    pub fn confetti_palette(&self) -> [Color32; 6] {
        [
            self.pink,
            self.purple,
            self.blue,
            self.yellow,
            self.orange,
            self.gold,
        ]
    }

    pub fn cat_palette(&self) -> [Color32; 6] {
        [
            self.pink,
            self.blue,
            self.purple,
            self.orange,
            Color32::from_rgb(0x55, 0x55, 0x55), // classic grey
            Color32::from_rgb(0x2C, 0x3E, 0x50), // navy
        ]
    }

    /// A cat that has just been startled.
    pub fn scared(&self) -> Color32 {
        Color32::from_rgb(0xFF, 0x00, 0x00)
    }

    /// Pick from a palette by an index that may exceed its length.
    pub fn pick(palette: &[Color32], index: usize) -> Color32 {
        if palette.is_empty() {
            return Color32::GRAY;
        }
        palette[index % palette.len()]
    }
}
