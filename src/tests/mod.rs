
mod propagation;
