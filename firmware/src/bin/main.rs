#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use drive_firmware::serial::{self, Transport, BAUD_RATE};
use drive_firmware::timebase::{self, CLOCK};
use drive_firmware::{outputs, Controller, DriveConfig, Hardware, StaticImu, WheelCounter};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{Async, Config as UartConfig, Uart, UartRx, UartTx};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
});

/// Shared between the UART tasks and the foreground loop.
static TRANSPORT: Transport = serial::transport();

/// Runs the UART tasks above the foreground loop.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[interrupt]
fn PWM_IRQ_WRAP() {
    timebase::on_wrap_interrupt();
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("drive controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Time base ---
    let _clock = timebase::start(p.PWM_SLICE4);

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BAUD_RATE;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    spawner.spawn(rx_task(rx).unwrap());
    spawner.spawn(tx_task(tx).unwrap());

    // --- Actuators and sensors ---
    let hw = Hardware {
        motor: outputs::esc(p.PWM_SLICE1, p.PIN_2),
        servo: outputs::steering(p.PWM_SLICE2, p.PIN_4),
        wheel_counter: WheelCounter::new(p.PWM_SLICE3, p.PIN_7),
        imu: StaticImu,
    };
    let mut controller = Controller::new(
        hw,
        DriveConfig::DEFAULT,
        CLOCK.now_us(),
        timebase::now_ms(),
    );

    info!("drive controller initialized, waiting for commands...");

    loop {
        controller.poll(&TRANSPORT, CLOCK.now_us(), timebase::now_ms());
        yield_now().await;
    }
}

/// Receive task - keeps the RX DMA running into the transport.
#[embassy_executor::task]
async fn rx_task(rx: UartRx<'static, Async>) {
    serial::run_rx(rx, &TRANSPORT).await
}

/// Transmit task - drains the transport's TX ring over DMA.
#[embassy_executor::task]
async fn tx_task(tx: UartTx<'static, Async>) {
    serial::run_tx(tx, &TRANSPORT).await
}
