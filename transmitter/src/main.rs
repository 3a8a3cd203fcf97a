#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

extern crate panic_semihosting;

mod clock;
mod logger;
mod radio;

use cortex_m::asm;
use log::error;

use stm32f1xx_hal::{
    prelude::*,
    adc::Adc,
    delay::Delay,
    gpio::{
        Analog, Input, Output, PullUp, PushPull, Pxx, State,
        gpioa::{ PA0, PA1 },
        gpiob::PB12, // LED
    },
    spi::{ Mode, Phase, Polarity, Spi },
    stm32::ADC1,
};

use remote::{
    config::SamplerConfig,
    hw::{ Panel, PulseIndicator },
    TransmitterLoop,
};

use clock::CycleClock;
use radio::Radio;

type Controls = Panel<ADC1, Adc<ADC1>, Pxx<Input<PullUp>>, PA0<Analog>, PA1<Analog>>;
type Indicator = PulseIndicator<PB12<Output<PushPull>>, Delay>;
type Link = TransmitterLoop<Controls, Radio, Indicator>;

// Refuse to run with a radio we could not set up.
fn halt() -> ! {
    loop {
        asm::wfi();
    }
}

#[rtic::app(device = stm32f1xx_hal::pac, peripherals = true)]
const APP: () = {
    struct Resources {
        link: Link,
        clock: CycleClock,
    }

    #[init]
    fn init(cx: init::Context) -> init::LateResources {
        logger::init();

        let mut core = cx.core;

        // Take ownership over the raw flash and rcc devices and convert them into the corresponding
        // HAL structs
        let mut flash = cx.device.FLASH.constrain();
        let mut rcc = cx.device.RCC.constrain();

        // Freeze the configuration of all the clocks in the system and store the frozen frequencies in
        // `clocks`
        let clocks = rcc.cfgr.use_hse(8.mhz()).sysclk(72.mhz()).freeze(&mut flash.acr);

        core.DCB.enable_trace();
        core.DWT.enable_cycle_counter();
        let clock = CycleClock::new(clocks.sysclk().0);

        // Prepare the alternate function I/O registers
        let mut afio = cx.device.AFIO.constrain(&mut rcc.apb2);

        let mut gpioa = cx.device.GPIOA.split(&mut rcc.apb2);
        let mut gpiob = cx.device.GPIOB.split(&mut rcc.apb2);

        let led = gpiob.pb12.into_push_pull_output_with_state(&mut gpiob.crh, State::Low);
        let indicator = PulseIndicator::new(led, Delay::new(core.SYST, clocks));

        // Buttons short to ground when pressed
        let buttons = [
            gpiob.pb10.into_pull_up_input(&mut gpiob.crh).downgrade(),
            gpiob.pb11.into_pull_up_input(&mut gpiob.crh).downgrade(),
        ];
        let pots = (
            gpioa.pa0.into_analog(&mut gpioa.crl),
            gpioa.pa1.into_analog(&mut gpioa.crl),
        );
        let adc = Adc::adc1(cx.device.ADC1, &mut rcc.apb2, clocks);
        let controls = Panel::new(adc, buttons, pots);

        let ce = gpiob.pb0.into_push_pull_output(&mut gpiob.crl);
        let csn = gpiob.pb1.into_push_pull_output(&mut gpiob.crl);

        let spi_pins = (
            gpioa.pa5.into_alternate_push_pull(&mut gpioa.crl),
            gpioa.pa6.into_floating_input(&mut gpioa.crl),
            gpioa.pa7.into_alternate_push_pull(&mut gpioa.crl),
        );

        let spi_mode = Mode {
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition
        };

        let spi = Spi::spi1(
            cx.device.SPI1,
            spi_pins,
            &mut afio.mapr,
            spi_mode,
            1.mhz(),
            clocks,
            &mut rcc.apb2
        );

        let radio = Radio::new(ce, csn, spi);

        let link = match TransmitterLoop::start(controls, radio, indicator, SamplerConfig::default()) {
            Ok(link) => link,
            Err(e) => {
                error!("{}", e);
                halt()
            }
        };

        init::LateResources { link, clock }
    }

    #[idle(resources = [ link, clock ])]
    fn idle(cx: idle::Context) -> ! {
        cx.resources.link.run(cx.resources.clock)
    }
};
