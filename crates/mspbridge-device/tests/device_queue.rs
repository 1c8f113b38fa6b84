use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use mspbridge_device::{
    reply_deadline, AbandonReason, Device, DeviceConfig, DeviceError, Reply, MAX_WAIT,
};
use mspbridge_frame::{encode_frame, Direction, Frame, MspCodec};
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::time::Instant;
use tokio_util::codec::FramedRead;

/// The flight controller end of an in-memory serial link.
struct FakeController {
    requests: FramedRead<ReadHalf<DuplexStream>, MspCodec>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeController {
    async fn next_request(&mut self) -> Frame {
        let frame = self
            .requests
            .next()
            .await
            .expect("link open")
            .expect("frame decodes");
        assert_eq!(frame.direction, Direction::Request);
        frame
    }

    async fn reply(&mut self, code: u8, payload: &[u8]) {
        let mut buf = BytesMut::new();
        encode_frame(Direction::Response, code, payload, &mut buf).unwrap();
        self.writer.write_all(&buf).await.unwrap();
    }
}

fn start() -> (
    Device,
    tokio::task::JoinHandle<mspbridge_device::Result<()>>,
    FakeController,
) {
    let (near, far) = tokio::io::duplex(1024);
    let (device, task) = Device::spawn(near, DeviceConfig::default());
    let (rd, wr) = tokio::io::split(far);
    let controller = FakeController {
        requests: FramedRead::new(rd, MspCodec::new()),
        writer: wr,
    };
    (device, task, controller)
}

#[tokio::test]
async fn request_receives_matching_reply() {
    let (device, _task, mut fc) = start();

    let pending = tokio::spawn({
        let device = device.clone();
        async move { device.request(101, Vec::new()).await }
    });

    let req = fc.next_request().await;
    assert_eq!(req.code, 101);
    assert!(req.payload.is_empty());
    fc.reply(101, &[1, 2, 3]).await;

    let reply = pending.await.unwrap().unwrap();
    assert_eq!(reply, Reply::Payload(vec![1u8, 2, 3].into()));
}

#[tokio::test(start_paused = true)]
async fn only_one_request_in_flight() {
    let (device, _task, mut fc) = start();

    let a = tokio::spawn({
        let device = device.clone();
        async move { device.request(108, Vec::new()).await }
    });
    let b = tokio::spawn({
        let device = device.clone();
        async move { device.request(109, Vec::new()).await }
    });

    let first = fc.next_request().await;
    let nothing = tokio::time::timeout(Duration::from_millis(100), fc.requests.next()).await;
    assert!(nothing.is_err(), "second request written before first resolved");

    fc.reply(first.code, &[first.code]).await;
    let second = fc.next_request().await;
    assert_ne!(first.code, second.code);
    fc.reply(second.code, &[second.code]).await;

    assert_eq!(a.await.unwrap().unwrap(), Reply::Payload(vec![108u8].into()));
    assert_eq!(b.await.unwrap().unwrap(), Reply::Payload(vec![109u8].into()));
}

#[tokio::test(start_paused = true)]
async fn silent_device_times_out_after_wait() {
    let (device, _task, mut fc) = start();
    let wait = Duration::from_millis(250);

    let started = Instant::now();
    let pending = tokio::spawn({
        let device = device.clone();
        async move { device.send(110, Vec::new(), wait).await }
    });
    fc.next_request().await;

    let reply = pending.await.unwrap().unwrap();
    let elapsed = started.elapsed();
    assert_eq!(reply, Reply::Abandoned(AbandonReason::Timeout));
    assert!(elapsed >= wait, "gave up early: {elapsed:?}");
    assert!(elapsed < wait + Duration::from_millis(10), "gave up late: {elapsed:?}");

    // The queue advances and the late reply is ignored while idle.
    fc.reply(110, &[0]).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let pending = tokio::spawn({
        let device = device.clone();
        async move { device.request(111, Vec::new()).await }
    });
    assert_eq!(fc.next_request().await.code, 111);
    fc.reply(111, &[7]).await;
    assert_eq!(pending.await.unwrap().unwrap(), Reply::Payload(vec![7u8].into()));
}

#[tokio::test]
async fn mismatched_code_abandons_request() {
    let (device, _task, mut fc) = start();

    let pending = tokio::spawn({
        let device = device.clone();
        async move { device.request(101, Vec::new()).await }
    });
    fc.next_request().await;
    fc.reply(102, &[]).await;

    let reply = pending.await.unwrap().unwrap();
    assert_eq!(reply, Reply::Abandoned(AbandonReason::Mismatch { code: 102 }));
}

#[tokio::test]
async fn requests_are_written_in_submission_order() {
    let (device, _task, mut fc) = start();

    let controller = tokio::spawn(async move {
        let mut seen = Vec::new();
        for _ in 0..3 {
            let req = fc.next_request().await;
            seen.push(req.code);
            fc.reply(req.code, &req.payload).await;
        }
        seen
    });

    let (a, b, c) = tokio::join!(
        device.request(1, vec![0xA1]),
        device.request(2, vec![0xB2]),
        device.request(3, vec![0xC3]),
    );
    assert_eq!(a.unwrap(), Reply::Payload(vec![0xA1u8].into()));
    assert_eq!(b.unwrap(), Reply::Payload(vec![0xB2u8].into()));
    assert_eq!(c.unwrap(), Reply::Payload(vec![0xC3u8].into()));
    assert_eq!(controller.await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn closed_device_reports_not_connected() {
    let (device, task, _fc) = start();
    device.close();
    task.await.unwrap().unwrap();

    assert!(!device.is_connected());
    let err = device.request(101, Vec::new()).await.unwrap_err();
    assert!(matches!(err, DeviceError::NotConnected));
}

#[tokio::test]
async fn serial_eof_fails_pending_request() {
    let (device, task, mut fc) = start();

    let pending = tokio::spawn({
        let device = device.clone();
        async move { device.request(101, Vec::new()).await }
    });
    fc.next_request().await;
    drop(fc);

    assert!(matches!(task.await.unwrap(), Err(DeviceError::Disconnected)));
    assert!(matches!(
        pending.await.unwrap(),
        Err(DeviceError::Disconnected)
    ));
}

#[tokio::test]
async fn oversized_payload_is_rejected_before_queueing() {
    let (device, _task, _fc) = start();
    let err = device.request(200, vec![0u8; 256]).await.unwrap_err();
    assert!(matches!(err, DeviceError::Frame(_)));
}

#[tokio::test(start_paused = true)]
async fn unbounded_wait_is_clamped() {
    let (device, _task, mut fc) = start();

    let pending = tokio::spawn({
        let device = device.clone();
        async move { device.send(101, Vec::new(), Duration::MAX).await }
    });
    fc.next_request().await;
    fc.reply(101, &[7]).await;

    let reply = pending.await.unwrap().unwrap();
    assert_eq!(reply, Reply::Payload(vec![7u8].into()));
    assert_eq!(reply_deadline(Duration::MAX) - Instant::now(), MAX_WAIT);
}
