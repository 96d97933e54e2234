mod add;
mod avg_pool2d;
mod channel_bias_add;
mod conv2d;
mod flatten;
mod leaky_relu;
mod mat_mul;
mod scalar_multiply;
mod tanh;

pub(in crate::nn) use add::Add;
pub(in crate::nn) use avg_pool2d::AvgPool2d;
pub(in crate::nn) use channel_bias_add::ChannelBiasAdd;
pub(in crate::nn) use conv2d::Conv2d;
pub(in crate::nn) use flatten::Flatten;
pub(in crate::nn) use leaky_relu::LeakyReLU;
pub(in crate::nn) use mat_mul::MatMul;
pub(in crate::nn) use scalar_multiply::ScalarMultiply;
pub(in crate::nn) use tanh::Tanh;
