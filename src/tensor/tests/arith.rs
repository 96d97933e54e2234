use crate::assert_panic;
use crate::tensor::Tensor;

#[test]
fn test_add_with_or_without_ownership() {
    let tensor1 = Tensor::new(&[1., 2., 3.], &[3]);
    let tensor2 = Tensor::new(&[4., 5., 6.], &[3]);
    let expected = Tensor::new(&[5., 7., 9.], &[3]);

    assert_eq!(&tensor1 + &tensor2, expected);
    assert_eq!(tensor1.clone() + &tensor2, expected);
    assert_eq!(&tensor1 + tensor2.clone(), expected);
    assert_eq!(tensor1.clone() + tensor2.clone(), expected);

    // 纯数在左右两侧
    assert_eq!(5. + &tensor1, Tensor::new(&[6., 7., 8.], &[3]));
    assert_eq!(&tensor1 + 5., Tensor::new(&[6., 7., 8.], &[3]));
}

#[test]
fn test_sub_mul_div_with_scalar() {
    let tensor = Tensor::new(&[2., 4., 6., 8.], &[2, 2]);
    assert_eq!(&tensor - 1., Tensor::new(&[1., 3., 5., 7.], &[2, 2]));
    assert_eq!(1. - &tensor, Tensor::new(&[-1., -3., -5., -7.], &[2, 2]));
    assert_eq!(&tensor * 0.5, Tensor::new(&[1., 2., 3., 4.], &[2, 2]));
    assert_eq!(&tensor / 2., Tensor::new(&[1., 2., 3., 4.], &[2, 2]));
    assert_eq!(8. / &tensor, Tensor::new(&[4., 2., 8. / 6., 1.], &[2, 2]));
    assert_eq!(-&tensor, Tensor::new(&[-2., -4., -6., -8.], &[2, 2]));
}

#[test]
fn test_elementwise_mul_and_div() {
    let a = Tensor::new(&[1., 2., 3., 4.], &[2, 2]);
    let b = Tensor::new(&[2., 2., 2., 4.], &[2, 2]);
    assert_eq!(&a * &b, Tensor::new(&[2., 4., 6., 16.], &[2, 2]));
    assert_eq!(&a / &b, Tensor::new(&[0.5, 1., 1.5, 1.], &[2, 2]));
}

#[test]
fn test_binary_op_shape_mismatch_panics() {
    let a = Tensor::new(&[1., 2., 3., 4.], &[1, 4]);
    let b = Tensor::new(&[1., 2., 3., 4.], &[4]);
    assert_panic!(
        &a + &b,
        "形状不一致，故无法相加：第一个张量的形状为[1, 4]，第二个张量的形状为[4]"
    );
    assert_panic!(&a * &b);
}

#[test]
fn test_assign_ops() {
    let mut a = Tensor::new(&[1., 2.], &[1, 2]);
    a += &Tensor::new(&[3., 4.], &[1, 2]);
    assert_eq!(a, Tensor::new(&[4., 6.], &[1, 2]));
    a *= 0.5;
    assert_eq!(a, Tensor::new(&[2., 3.], &[1, 2]));
}

#[test]
fn test_try_new_rejects_bad_shape() {
    assert!(Tensor::try_new(&[1., 2., 3.], &[2, 2]).is_err());
    assert_panic!(Tensor::new(&[1., 2., 3.], &[2, 2]));
}
