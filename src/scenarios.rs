//! Built-in sketches the harness can run by name

use esplora_mcu::{Board, Level, PinMode, Sketch, TemperatureScale};

pub const SCENARIOS: [(&str, &str); 6] = [
    ("blink", "toggle the LED on pin 13 every 250 ms"),
    ("rgb_fade", "ramp the RGB LED through red, green and blue"),
    ("buzzer", "play a short two-note melody on the buzzer"),
    ("button_lamp", "light the red LED while switch 1 is held"),
    ("dice", "print a die roll every 100 ms"),
    ("sensors", "print slider, light and temperature every 100 ms"),
];

/// Build the sketch registered under `name`.
pub fn scenario(name: &str) -> Option<Box<dyn Sketch>> {
    let sketch: Box<dyn Sketch> = match name {
        "blink" => Box::new(Blink),
        "rgb_fade" => Box::new(RgbFade::default()),
        "buzzer" => Box::new(Buzzer),
        "button_lamp" => Box::new(ButtonLamp),
        "dice" => Box::new(Dice),
        "sensors" => Box::new(Sensors),
        _ => return None,
    };
    Some(sketch)
}

const LED_PIN: i32 = 13;

struct Blink;

impl Sketch for Blink {
    fn setup(&mut self, board: &mut Board) {
        board.pin_mode(LED_PIN, PinMode::Output);
    }

    fn run_loop(&mut self, board: &mut Board) {
        board.digital_write(LED_PIN, Level::High);
        board.delay(250);
        board.digital_write(LED_PIN, Level::Low);
        board.delay(250);
    }

    fn name(&self) -> &str {
        "blink"
    }
}

#[derive(Default)]
struct RgbFade {
    step: u16,
}

impl Sketch for RgbFade {
    fn setup(&mut self, board: &mut Board) {
        board.write_rgb(0, 0, 0);
    }

    fn run_loop(&mut self, board: &mut Board) {
        // 0..=255 rising, then falling, for each colour in turn
        let phase = self.step % 512;
        let level = (if phase < 256 { phase } else { 511 - phase }) as u8;
        match (self.step / 512) % 3 {
            0 => board.write_rgb(level, 0, 0),
            1 => board.write_rgb(0, level, 0),
            _ => board.write_rgb(0, 0, level),
        }
        self.step = (self.step + 5) % 1536;
        board.delay(10);
    }

    fn name(&self) -> &str {
        "rgb_fade"
    }
}

struct Buzzer;

impl Sketch for Buzzer {
    fn setup(&mut self, _board: &mut Board) {}

    fn run_loop(&mut self, board: &mut Board) {
        board.buzzer_tone_for(440, 100);
        board.delay(150);
        board.buzzer_tone_for(660, 100);
        board.delay(400);
    }

    fn name(&self) -> &str {
        "buzzer"
    }
}

struct ButtonLamp;

impl Sketch for ButtonLamp {
    fn setup(&mut self, board: &mut Board) {
        board.write_red(0);
    }

    fn run_loop(&mut self, board: &mut Board) {
        let held = board.read_button(1) == Level::Low;
        board.write_red(if held { 255 } else { 0 });
        board.delay(5);
    }

    fn name(&self) -> &str {
        "button_lamp"
    }
}

struct Dice;

impl Sketch for Dice {
    fn setup(&mut self, board: &mut Board) {
        board.serial().begin(9600);
        board.random_seed(42);
    }

    fn run_loop(&mut self, board: &mut Board) {
        let roll = board.random_between(1, 7);
        board.serial().print("roll: ");
        board.serial().println(roll);
        board.delay(100);
    }

    fn name(&self) -> &str {
        "dice"
    }
}

struct Sensors;

impl Sketch for Sensors {
    fn setup(&mut self, board: &mut Board) {
        board.serial().begin(115200);
    }

    fn run_loop(&mut self, board: &mut Board) {
        let slider = board.read_slider();
        let light = board.read_light_sensor();
        let celsius = board.read_temperature(TemperatureScale::Celsius);
        let serial = board.serial();
        serial.print("slider=");
        serial.print(slider);
        serial.print(" light=");
        serial.print(light);
        serial.print(" temp=");
        serial.println(celsius);
        board.delay(100);
    }

    fn name(&self) -> &str {
        "sensors"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_scenario_exists() {
        for (name, _) in SCENARIOS {
            let sketch = scenario(name).unwrap();
            assert_eq!(sketch.name(), name);
        }
        assert!(scenario("nope").is_none());
    }
}
