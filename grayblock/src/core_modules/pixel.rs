// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most basic unit of the pixelation engine. It is a
// "dumb" data container for a single RGB pixel plus the one heuristic the engine
// needs from it: perceived brightness. Everything here is computed from this pixel
// alone, with no knowledge of neighbours. Anything that needs more than one pixel
// (block averages, resampling) lives in `block_grid` or `resample`.
//
// Brightness uses the Rec. 601 luma weights (0.299, 0.587, 0.114) over the
// gamma-encoded 0..255 channels. `gray()` rounds that value back to a byte so a
// pixel can be replaced by `(gray, gray, gray)`. Rounding (rather than truncation)
// keeps pure white at 255 and makes the conversion idempotent: a pixel that is
// already gray maps to itself.

pub mod pixel {
    use image::Rgb;

    pub type Channel = u8;
    pub type Luminance = f64;
    pub type Gray = u8;

    /// Number of colour channels carried through the engine. Alpha is dropped on decode.
    pub const CHANNELS: usize = 3;

    const RED_WEIGHT: Luminance = 0.299;
    const GREEN_WEIGHT: Luminance = 0.587;
    const BLUE_WEIGHT: Luminance = 0.114;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// A pixel with the same value in every channel.
        pub fn splat(value: Channel) -> Self {
            Pixel::new(value, value, value)
        }

        /// Luminance estimate (Rec. 601 luma) in the 0.0..=255.0 range.
        pub fn luminance(&self) -> Luminance {
            RED_WEIGHT * self.red as Luminance
                + GREEN_WEIGHT * self.green as Luminance
                + BLUE_WEIGHT * self.blue as Luminance
        }

        /// Luminance rounded to the nearest byte.
        pub fn gray(&self) -> Gray {
            self.luminance().round().clamp(0.0, 255.0) as Gray
        }

        /// The gray pixel that replaces this one: `(gray, gray, gray)`.
        pub fn to_gray(&self) -> Pixel {
            Pixel::splat(self.gray())
        }

        pub fn is_gray(&self) -> bool {
            self.red == self.green && self.green == self.blue
        }
    }

    impl From<Rgb<Channel>> for Pixel {
        fn from(rgb: Rgb<Channel>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }

    impl From<&Rgb<Channel>> for Pixel {
        fn from(rgb: &Rgb<Channel>) -> Self {
            Pixel::from(*rgb)
        }
    }

    impl From<Pixel> for Rgb<Channel> {
        fn from(pixel: Pixel) -> Self {
            Rgb([pixel.red, pixel.green, pixel.blue])
        }
    }
}
