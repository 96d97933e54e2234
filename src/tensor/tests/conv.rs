use crate::tensor::{Tensor, conv2d_output_size};
use approx::assert_abs_diff_eq;

#[test]
fn test_conv2d_output_size() {
    assert_eq!(conv2d_output_size((5, 5), (3, 3), (1, 1), (0, 0)), Some((3, 3)));
    assert_eq!(conv2d_output_size((5, 5), (3, 3), (1, 1), (1, 1)), Some((5, 5)));
    assert_eq!(conv2d_output_size((4, 4), (2, 2), (2, 2), (0, 0)), Some((2, 2)));
    assert_eq!(conv2d_output_size((2, 2), (3, 3), (1, 1), (0, 0)), None);
}

#[test]
fn test_conv2d_forward() {
    // 单样本单通道 3x3 输入，2x2 全一卷积核
    let input = Tensor::new(&[1., 2., 3., 4., 5., 6., 7., 8., 9.], &[1, 1, 3, 3]);
    let kernel = Tensor::ones(&[1, 1, 2, 2]);
    let output = input.conv2d(&kernel, (1, 1), (0, 0)).unwrap();
    assert_eq!(output, Tensor::new(&[12., 16., 24., 28.], &[1, 1, 2, 2]));
}

#[test]
fn test_conv2d_forward_with_padding() {
    let input = Tensor::ones(&[1, 1, 2, 2]);
    let kernel = Tensor::ones(&[1, 1, 3, 3]);
    let output = input.conv2d(&kernel, (1, 1), (1, 1)).unwrap();
    // 每个位置都能覆盖到全部4个元素
    assert_eq!(output, Tensor::full(4., &[1, 1, 2, 2]));
}

#[test]
fn test_conv2d_channel_mismatch() {
    let input = Tensor::ones(&[1, 2, 3, 3]);
    let kernel = Tensor::ones(&[1, 1, 2, 2]);
    assert!(input.conv2d(&kernel, (1, 1), (0, 0)).is_err());
}

#[test]
fn test_conv2d_grads_match_manual_sum() {
    let input = Tensor::new(&[1., 2., 3., 4., 5., 6., 7., 8., 9.], &[1, 1, 3, 3]);
    let kernel = Tensor::new(&[1., -1., 2., 0.5], &[1, 1, 2, 2]);
    let upstream = Tensor::ones(&[1, 1, 2, 2]);

    // 上游梯度全一时，dL/dK 等于每个核位置覆盖到的输入之和
    let grad_k =
        Tensor::conv2d_grad_kernel(&upstream, &input, &[1, 1, 2, 2], (1, 1), (0, 0)).unwrap();
    assert_eq!(grad_k, Tensor::new(&[12., 16., 24., 28.], &[1, 1, 2, 2]));

    // dL/dX 的中心元素被4个窗口覆盖，等于核元素之和
    let grad_x =
        Tensor::conv2d_grad_input(&upstream, &kernel, &[1, 1, 3, 3], (1, 1), (0, 0)).unwrap();
    assert_abs_diff_eq!(grad_x.to_vec()[4], 2.5);
    assert_abs_diff_eq!(grad_x.to_vec()[0], 1.0);
}

#[test]
fn test_avg_pool2d_forward_and_grad() {
    let input = Tensor::new(
        &[1., 2., 3., 4., 5., 6., 7., 8., 9., 10., 11., 12., 13., 14., 15., 16.],
        &[1, 1, 4, 4],
    );
    let output = input.avg_pool2d(2).unwrap();
    assert_eq!(output, Tensor::new(&[3.5, 5.5, 11.5, 13.5], &[1, 1, 2, 2]));

    let grad = Tensor::avg_pool2d_grad(&Tensor::ones(&[1, 1, 2, 2]), &[1, 1, 4, 4], 2).unwrap();
    assert_eq!(grad, Tensor::full(0.25, &[1, 1, 4, 4]));
    assert!(Tensor::ones(&[1, 1, 1, 1]).avg_pool2d(2).is_err());
}

#[test]
fn test_add_channel_bias() {
    let input = Tensor::zeros(&[2, 2, 1, 1]);
    let bias = Tensor::new(&[1., -1.], &[1, 2]);
    let output = input.add_channel_bias(&bias).unwrap();
    assert_eq!(output, Tensor::new(&[1., -1., 1., -1.], &[2, 2, 1, 1]));
    assert!(input.add_channel_bias(&Tensor::ones(&[1, 3])).is_err());
}
