#![no_std]
#![no_main]

use bme680::{Bme680, I2CAddress, IIRFilterSize, OversamplingSetting, SettingsBuilder};
use bsp::entry;
use defmt::*;
use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use hd44780_driver::HD44780;
use panic_probe as _;
use rp_pico::hal::Timer;

// Provide an alias for our BSP so we can switch targets quickly.
use rp_pico as bsp;

use bsp::hal::{
    clocks::{init_clocks_and_plls, Clock},
    pac,
    uart::{DataBits, StopBits, UartConfig, UartPeripheral},
    watchdog::Watchdog,
};
use frostwatch::board::{millis, restart, Bridge, Probes, Screen};
use frostwatch::bridge::BridgeEvent;
use frostwatch::button::read_level;
use frostwatch::monitor::{Control, Monitor};
use frostwatch::notify::IftttNotifier;
use frostwatch::preferences::{Credentials, EventNames, Preferences};
use frostwatch::timer::TICK_TIME_DELAY;
use rp_pico::hal;
use rp_pico::hal::fugit::RateExtU32;
use rp_pico::hal::gpio::{FunctionI2C, FunctionUart, Pin, PullDown, PullUp};

const fn or_default(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(value) => value,
        None => default,
    }
}

// Baked in at build time, see build.rs
const SSID: &str = or_default(option_env!("FROSTWATCH_SSID"), "frostwatch");
const PASSWORD: &str = or_default(option_env!("FROSTWATCH_PASSWORD"), "");
const API_KEY: &str = or_default(option_env!("FROSTWATCH_API_KEY"), "");
const FINGERPRINT: &str = or_default(
    option_env!("FROSTWATCH_FINGERPRINT"),
    "AA 75 CB 41 2E D5 F9 97 FF 5D A0 8B 7D AC 12 21 08 4B 00 8C",
);
const ALERT_EVENT: &str = or_default(option_env!("FROSTWATCH_ALERT_EVENT"), "alert");
const REPEAT_EVENT: Option<&str> = option_env!("FROSTWATCH_REPEAT_EVENT");
const CLEAR_EVENT: &str = or_default(option_env!("FROSTWATCH_CLEAR_EVENT"), "clear");

#[entry]
fn main() -> ! {
    info!("Frostwatch Starting");
    // Grab our singleton objects
    let mut pac = pac::Peripherals::take().unwrap();

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    // Configure the clocks
    //
    // The default is to generate a 125 MHz system clock
    let clocks = init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    // The single-cycle I/O block controls our GPIO pins
    let sio = hal::Sio::new(pac.SIO);

    // Set the pins up according to their function on this particular board
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut delay = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Set up both BME680 probes, one per I2C block
    let sda0: Pin<_, FunctionI2C, PullUp> = pins.gpio8.reconfigure();
    let scl0: Pin<_, FunctionI2C, PullUp> = pins.gpio9.reconfigure();
    let sda1: Pin<_, FunctionI2C, PullUp> = pins.gpio14.reconfigure();
    let scl1: Pin<_, FunctionI2C, PullUp> = pins.gpio15.reconfigure();
    let i2c0 = hal::I2C::i2c0(
        pac.I2C0,
        sda0,
        scl0,
        100.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );
    let i2c1 = hal::I2C::i2c1(
        pac.I2C1,
        sda1,
        scl1,
        100.kHz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );

    let settings = || {
        SettingsBuilder::new()
            .with_temperature_oversampling(OversamplingSetting::OS8x)
            .with_temperature_filter(IIRFilterSize::Size3)
            .with_run_gas(false)
            .build()
    };
    let mut first = Bme680::init(i2c0, &mut delay, I2CAddress::Primary).unwrap();
    first.set_sensor_settings(&mut delay, settings()).unwrap();
    let mut second = Bme680::init(i2c1, &mut delay, I2CAddress::Primary).unwrap();
    second.set_sensor_settings(&mut delay, settings()).unwrap();
    let mut probes = Probes::new(first, second, delay);

    // Set up HD44780 LCD and its backlight
    let lcd = HD44780::new_4bit(
        pins.gpio0.into_push_pull_output(),
        pins.gpio1.into_push_pull_output(),
        pins.gpio2.into_push_pull_output(),
        pins.gpio3.into_push_pull_output(),
        pins.gpio4.into_push_pull_output(),
        pins.gpio5.into_push_pull_output(),
        &mut delay,
    )
    .unwrap();
    let mut screen = Screen::new(lcd, pins.gpio13.into_push_pull_output(), delay);

    // Set up button
    let mut button = pins.gpio10.into_pull_down_input();

    // Set up the network bridge
    let uart_pins: (Pin<_, FunctionUart, PullDown>, Pin<_, FunctionUart, PullDown>) =
        (pins.gpio16.into_function(), pins.gpio17.into_function());
    let uart = UartPeripheral::new(
        pac.UART0,
        uart_pins,
        &mut pac.RESETS,
    )
    .enable(
        UartConfig::new(115_200.Hz(), DataBits::Eight, None, StopBits::One),
        clocks.peripheral_clock.freq(),
    )
    .unwrap();
    let mut bridge = Bridge::new(uart, delay);
    if !bridge.join(SSID, PASSWORD) {
        warn!("bridge did not join {}", SSID);
    }

    let credentials = Credentials {
        ssid: SSID,
        password: PASSWORD,
        api_key: API_KEY,
        fingerprint: FINGERPRINT,
        events: EventNames::new(ALERT_EVENT, REPEAT_EVENT, CLEAR_EVENT),
    };
    let mut notifier = IftttNotifier::new(bridge, credentials);
    let mut monitor = Monitor::new(Preferences::default());

    info!("Frostwatch Ready");

    loop {
        delay.delay_ms(TICK_TIME_DELAY as u32);

        let now = millis(&delay);
        let level = read_level(&mut button);
        if monitor.tick(now, level, &mut probes, &mut notifier, &mut screen) == Control::Restart {
            restart();
        }

        match notifier.link_mut().poll() {
            Some(BridgeEvent::Time(secs)) => monitor.sync_clock(secs, now),
            Some(BridgeEvent::Address(address)) => monitor.set_address(&address),
            Some(BridgeEvent::Request) => {
                let bridge = notifier.link_mut();
                bridge.begin_reply();
                if monitor.serve_status(bridge, now).is_err() {
                    warn!("status page not sent");
                }
                bridge.end_reply();
            }
            None => {}
        }
    }
}
