use plotters::style::{RGBAColor, RGBColor, BLUE, CYAN, GREEN, RED, YELLOW};

/// Series colours, assigned in series order and reused from the start once exhausted.
pub const SERIES_PALETTE: [RGBColor; 5] = [RED, GREEN, BLUE, YELLOW, CYAN];

pub fn series_color(index: usize) -> RGBColor {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

/// Chart theme configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartTheme {
    pub background_color: RGBAColor,
    pub text_color: RGBAColor,
    pub grid_color: RGBAColor,
    pub axis_color: RGBAColor,
}

impl ChartTheme {
    pub fn light() -> Self {
        Self {
            background_color: RGBAColor(255, 255, 255, 1.0),
            text_color: RGBAColor(0, 0, 0, 1.0),
            grid_color: RGBAColor(128, 128, 128, 1.0),
            axis_color: RGBAColor(0, 0, 0, 1.0),
        }
    }

    pub fn dark() -> Self {
        Self {
            background_color: RGBAColor(0, 0, 0, 0.94),
            text_color: RGBAColor(255, 255, 255, 1.0),
            grid_color: RGBAColor(211, 211, 211, 1.0),
            axis_color: RGBAColor(255, 255, 255, 1.0),
        }
    }

    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::light()
    }
}

/// Chart style configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartStyle {
    pub line_width: u32,
    pub axis_width: u32,
    pub point_radius: u32,
    pub font_size: u32,
    pub margin: u32,
    /// Room left of the plot area for the value labels
    pub label_area_size: u32,
    /// Room below the plot area for the date labels
    pub date_area_size: u32,
    /// Straight pieces each curve segment is flattened into
    pub curve_steps: usize,
    /// Text needs a system font when rasterising; turn off for headless bitmaps.
    pub draw_text: bool,
    pub draw_legend: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            line_width: 2,
            axis_width: 2,
            point_radius: 5,
            font_size: 15,
            margin: 10,
            label_area_size: 50,
            date_area_size: 80,
            curve_steps: 16,
            draw_text: true,
            draw_legend: true,
        }
    }
}

impl ChartStyle {
    /// Image size needed for a plot area of `width` x `height`.
    pub fn image_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width + self.label_area_size + 2 * self.margin,
            height + self.date_area_size + 2 * self.margin,
        )
    }

    /// Top-left corner of the plot area inside the image.
    pub fn origin(&self) -> (i32, i32) {
        ((self.label_area_size + self.margin) as i32, self.margin as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        assert_eq!(series_color(0), RED);
        assert_eq!(series_color(4), CYAN);
        assert_eq!(series_color(5), RED);
        assert_eq!(series_color(7), BLUE);
    }

    #[test]
    fn test_image_fits_plot_area() {
        let style = ChartStyle::default();
        let (w, h) = style.image_size(400, 300);
        let (ox, oy) = style.origin();
        assert!(ox as u32 + 400 <= w);
        assert!(oy as u32 + 300 + style.date_area_size <= h);
        assert_ne!(ChartTheme::for_mode(true), ChartTheme::for_mode(false));
    }
}
